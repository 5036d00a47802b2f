use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use axum::http::HeaderMap;
use tokio::sync::Mutex;
use ticketgate_core::auth::{StoreError, TicketStore};
use ticketgate_core::settings::TicketSettings;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::cookies::{request_cookie, ResponseCookies, SetCookie};

pub const SESSION_COOKIE_NAME: &str = "TICKETGATE_SESSION";

#[derive(Debug, Clone)]
struct Session {
    values: HashMap<String, String>,
    expires_at: SystemTime,
}

/// In-memory session storage shared by all requests
///
/// Sessions expire `ttl` after their last write.
#[derive(Debug, Clone)]
pub struct MemorySessionBackend {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    ttl: Duration,
}

impl MemorySessionBackend {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn create_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub async fn get(&self, session_id: &str, key: &str) -> Option<String> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(session_id) {
            Some(session) if session.expires_at <= SystemTime::now() => {
                debug!("Session {} expired", session_id);
                sessions.remove(session_id);
                None
            }
            Some(session) => session.values.get(key).cloned(),
            None => None,
        }
    }

    pub async fn set(&self, session_id: &str, key: &str, value: &str) {
        let expires_at = SystemTime::now() + self.ttl;
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session {
                values: HashMap::new(),
                expires_at,
            });
        session.values.insert(key.to_string(), value.to_string());
        session.expires_at = expires_at;
    }

    /// Drop a session with everything stored in it
    pub async fn destroy(&self, session_id: &str) {
        if self.sessions.lock().await.remove(session_id).is_some() {
            debug!("Session {} destroyed", session_id);
        }
    }

    /// Drop expired sessions, returns how many were removed
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let initial_count = sessions.len();
        let now = SystemTime::now();
        sessions.retain(|_, session| session.expires_at > now);

        let removed_count = initial_count - sessions.len();
        if removed_count > 0 {
            info!(
                "Cleaned up {} expired session(s), {} remaining",
                removed_count,
                sessions.len()
            );
        }
        removed_count
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

/// Ticket kept server-side under the request's session id
///
/// A session id is only handed out once a ticket is stored, so anonymous
/// requests never create sessions. Every stored ticket gets a fresh session
/// id and the previous session is destroyed, so an id the client brought
/// along never carries a ticket.
#[derive(Debug)]
pub struct SessionTicketStore {
    backend: MemorySessionBackend,
    key: String,
    secure: bool,
    session_id: Mutex<Option<String>>,
    cookies: ResponseCookies,
}

impl SessionTicketStore {
    pub fn from_request(
        backend: MemorySessionBackend,
        settings: &TicketSettings,
        headers: &HeaderMap,
        cookies: ResponseCookies,
    ) -> Self {
        Self {
            backend,
            key: settings.cookie_name.clone(),
            secure: settings.secure_cookie,
            session_id: Mutex::new(request_cookie(headers, SESSION_COOKIE_NAME)),
            cookies,
        }
    }
}

#[async_trait]
impl TicketStore for SessionTicketStore {
    async fn put(&self, ticket: &str) -> Result<(), StoreError> {
        let mut session_id = self.session_id.lock().await;
        if let Some(previous) = session_id.take() {
            self.backend.destroy(&previous).await;
        }

        let id = MemorySessionBackend::create_session_id();
        self.backend.set(&id, &self.key, ticket).await;
        self.cookies
            .push(SetCookie::new(SESSION_COOKIE_NAME, &id).with_secure(self.secure))
            .await;
        *session_id = Some(id);
        Ok(())
    }

    async fn get(&self) -> Result<Option<String>, StoreError> {
        match self.session_id.lock().await.as_ref() {
            Some(id) => Ok(self.backend.get(id, &self.key).await),
            None => Ok(None),
        }
    }

    async fn clear(&self) -> Result<(), StoreError> {
        if let Some(id) = self.session_id.lock().await.take() {
            self.backend.destroy(&id).await;
            self.cookies
                .push(SetCookie::removal(SESSION_COOKIE_NAME).with_secure(self.secure))
                .await;
        }
        Ok(())
    }
}
