//! Ticket based authentication
//!
//! `TicketAuthenticator` issues tickets on login, validates them on every
//! request, refreshes them before they expire and clears them on logout.
//! Tickets are read and written only through the request's `TicketStore`.

pub mod authenticator;
pub mod clock;
pub mod store;

pub use authenticator::{AuthError, Identity, TicketAuthenticator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{MemoryTicketStore, StoreError, TicketStore};
