use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TicketError {
    /// Malformed ticket or signature mismatch, reported alike
    #[error("Invalid ticket")]
    Invalid,

    #[error("Ticket expired: age {age}s exceeds max age {max_age}s")]
    Expired { age: u64, max_age: u64 },

    #[error("Ticket user id must not be empty")]
    EmptyUserId,

    #[error("Ticket signing key rejected")]
    InvalidKey,
}
