//! ticketgate core
//!
//! Signed, time-limited authentication tickets and first-match-wins access
//! control lists. Nothing in here knows about HTTP: tickets are read and
//! written through a `TicketStore`, group memberships come from a
//! `GroupsCallback`, and both are bound to a per-request `RequestContext`.

pub mod auth;
pub mod authorization;
pub mod context;
pub mod settings;
pub mod ticket;
pub mod utils;
