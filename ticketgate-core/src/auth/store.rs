use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Ticket store backend error: {0}")]
    Backend(String),
}

/// Storage capability for raw ticket strings, bound to one request
///
/// Implementations persist whatever bytes they are given and must hand them
/// back unchanged. `put` and `clear` are single writes so an aborted request
/// never leaves a half-written ticket behind.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn put(&self, ticket: &str) -> Result<(), StoreError>;

    async fn get(&self) -> Result<Option<String>, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory ticket store
///
/// Clones share the same slot, which lets tests reuse one "browser" across
/// several request contexts.
#[derive(Debug, Clone, Default)]
pub struct MemoryTicketStore {
    ticket: Arc<Mutex<Option<String>>>,
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket(ticket: impl Into<String>) -> Self {
        Self {
            ticket: Arc::new(Mutex::new(Some(ticket.into()))),
        }
    }

    /// Current raw value without going through the trait
    pub async fn peek(&self) -> Option<String> {
        self.ticket.lock().await.clone()
    }
}

#[async_trait]
impl TicketStore for MemoryTicketStore {
    async fn put(&self, ticket: &str) -> Result<(), StoreError> {
        *self.ticket.lock().await = Some(ticket.to_string());
        Ok(())
    }

    async fn get(&self) -> Result<Option<String>, StoreError> {
        Ok(self.ticket.lock().await.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.ticket.lock().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryTicketStore::new();
        assert_eq!(store.get().await.unwrap(), None);

        store.put("abc!def").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some("abc!def".to_string()));

        store.clear().await.unwrap();
        assert_eq!(store.get().await.unwrap(), None);

        // clearing twice is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_state() {
        let store = MemoryTicketStore::new();
        let other = store.clone();

        store.put("ticket").await.unwrap();
        assert_eq!(other.peek().await, Some("ticket".to_string()));
    }
}
