pub mod authorization;
pub mod ticket;

pub use authorization::{require_auth, require_permission};
pub use ticket::{ticket_middleware, TicketContext};
