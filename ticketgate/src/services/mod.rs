pub mod groups;

pub use groups::ConfiguredGroups;
