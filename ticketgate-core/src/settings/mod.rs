pub mod api_server;
pub mod ticket;

pub use ticket::{SettingsError, TicketSettings, TicketStorage};
