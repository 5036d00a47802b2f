//! Signed, time-limited authentication tickets
//!
//! A ticket binds a user id and opaque user data to the time it was issued.
//! The binding is protected by a keyed MAC so a ticket can travel through an
//! untrusted channel (a cookie, a session store) and still be verified.

mod codec;
mod error;

pub use codec::{HashAlgorithm, TicketCodec};
pub use error::TicketError;

/// Decoded contents of a ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub user_id: String,
    pub user_data: String,
    /// Unix timestamp (seconds) of issue or last refresh
    pub issue_time: u64,
}

impl Ticket {
    pub fn new(user_id: impl Into<String>, user_data: impl Into<String>, issue_time: u64) -> Self {
        Self {
            user_id: user_id.into(),
            user_data: user_data.into(),
            issue_time,
        }
    }

    /// Age of the ticket at `now`. Tickets from the future have age zero.
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.issue_time)
    }

    /// Same identity, new issue time
    pub fn refreshed(&self, now: u64) -> Self {
        Self {
            user_id: self.user_id.clone(),
            user_data: self.user_data.clone(),
            issue_time: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_saturates_for_future_tickets() {
        let ticket = Ticket::new("alice", "", 1_000);
        assert_eq!(ticket.age(1_500), 500);
        assert_eq!(ticket.age(900), 0);
    }

    #[test]
    fn test_refreshed_keeps_identity() {
        let ticket = Ticket::new("alice", "role=editor", 1_000);
        let refreshed = ticket.refreshed(2_000);

        assert_eq!(refreshed.user_id, "alice");
        assert_eq!(refreshed.user_data, "role=editor");
        assert_eq!(refreshed.issue_time, 2_000);
        assert_eq!(ticket.issue_time, 1_000);
    }
}
