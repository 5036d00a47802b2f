//! HTTP-backed ticket stores
//!
//! Both stores are created per request by the ticket middleware. The cookie
//! store keeps the ticket in the client's cookie, the session store keeps it
//! server-side and only hands out a random session id.

pub mod cookie;
pub mod session;

pub use cookie::CookieTicketStore;
pub use session::{MemorySessionBackend, SessionTicketStore, SESSION_COOKIE_NAME};
