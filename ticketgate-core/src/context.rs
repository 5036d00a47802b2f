//! Per-request state shared by authentication and authorization
//!
//! A `RequestContext` is created for every incoming request and dropped
//! with it. It owns the request's ticket store binding and caches the
//! decoded identity and the resolved group sets, so neither is computed
//! more than once per request.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::{Identity, TicketStore};
use crate::authorization::GroupSet;

pub struct RequestContext {
    store: Arc<dyn TicketStore>,
    client_ip: Option<IpAddr>,
    /// `None` until the ticket was looked at, then the outcome
    pub(crate) identity: Mutex<Option<Option<Identity>>>,
    /// Refreshed ticket waiting to be written with the response
    pub(crate) pending_reissue: Mutex<Option<String>>,
    /// Resolved groups keyed by user id
    pub(crate) groups: Mutex<HashMap<Option<String>, Option<GroupSet>>>,
}

pub type SharedRequestContext = Arc<RequestContext>;

impl RequestContext {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self {
            store,
            client_ip: None,
            identity: Mutex::new(None),
            pending_reissue: Mutex::new(None),
            groups: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_client_ip(mut self, client_ip: Option<IpAddr>) -> Self {
        self.client_ip = client_ip;
        self
    }

    pub fn into_shared(self) -> SharedRequestContext {
        Arc::new(self)
    }

    pub fn store(&self) -> &dyn TicketStore {
        self.store.as_ref()
    }

    pub fn client_ip(&self) -> Option<IpAddr> {
        self.client_ip
    }

    pub async fn has_pending_reissue(&self) -> bool {
        self.pending_reissue.lock().await.is_some()
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("client_ip", &self.client_ip)
            .finish_non_exhaustive()
    }
}
