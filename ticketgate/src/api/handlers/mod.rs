pub mod health;
pub mod login;
pub mod resources;
pub mod whoami;
