use std::net::IpAddr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::store::StoreError;
use crate::context::RequestContext;
use crate::settings::{SettingsError, TicketSettings};
use crate::ticket::{Ticket, TicketCodec, TicketError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Authenticated principal carried by a valid ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub user_data: String,
}

impl From<Ticket> for Identity {
    fn from(ticket: Ticket) -> Self {
        Self {
            user_id: ticket.user_id,
            user_data: ticket.user_data,
        }
    }
}

/// Issues, validates, refreshes and clears tickets
///
/// Holds only immutable configuration, so one instance is shared by all
/// requests. Everything request-specific lives in the `RequestContext`.
#[derive(Debug, Clone)]
pub struct TicketAuthenticator {
    codec: TicketCodec,
    max_age: u64,
    reissue_time: Option<u64>,
    include_ip: bool,
    clock: Arc<dyn Clock>,
}

impl TicketAuthenticator {
    pub fn new(codec: TicketCodec, max_age: u64) -> Self {
        Self {
            codec,
            max_age,
            reissue_time: None,
            include_ip: false,
            clock: Arc::new(SystemClock),
        }
    }

    /// Build from validated settings. Invalid settings are a setup error.
    pub fn from_settings(settings: &TicketSettings) -> Result<Self, SettingsError> {
        settings.validate()?;

        let codec = TicketCodec::with_algorithm(
            settings.secret.expose_secret().as_bytes(),
            settings.hash_algorithm,
        );

        Ok(Self::new(codec, settings.max_age)
            .with_reissue_time(settings.reissue_time)
            .with_include_ip(settings.include_ip))
    }

    /// Refresh tickets older than `reissue_time` seconds
    pub fn with_reissue_time(mut self, reissue_time: Option<u64>) -> Self {
        self.reissue_time = reissue_time;
        self
    }

    /// Bind tickets to the client IP of the request that issued them
    pub fn with_include_ip(mut self, include_ip: bool) -> Self {
        self.include_ip = include_ip;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn codec(&self) -> &TicketCodec {
        &self.codec
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    pub fn reissue_time(&self) -> Option<u64> {
        self.reissue_time
    }

    /// Issue a fresh ticket for `user_id` and store it
    pub async fn remember(
        &self,
        ctx: &RequestContext,
        user_id: &str,
        user_data: &str,
    ) -> Result<(), AuthError> {
        let ticket = Ticket::new(user_id, user_data, self.clock.now());
        let raw = self.codec.encode(&ticket, self.bound_ip(ctx))?;

        ctx.store().put(&raw).await?;

        // An explicit login supersedes any refresh computed earlier
        *ctx.pending_reissue.lock().await = None;
        *ctx.identity.lock().await = Some(Some(Identity::from(ticket)));

        info!("Issued ticket for user '{}'", user_id);
        Ok(())
    }

    /// Clear the stored ticket. Calling this without a ticket is fine.
    pub async fn forget(&self, ctx: &RequestContext) -> Result<(), AuthError> {
        ctx.store().clear().await?;

        *ctx.pending_reissue.lock().await = None;
        let previous = ctx.identity.lock().await.replace(None).flatten();

        match previous {
            Some(identity) => info!("Cleared ticket for user '{}'", identity.user_id),
            None => debug!("Cleared ticket store"),
        }
        Ok(())
    }

    /// User id of the request's ticket, or `None` for anonymous callers
    pub async fn get_ticket(&self, ctx: &RequestContext) -> Option<String> {
        self.get_identity(ctx)
            .await
            .map(|identity| identity.user_id)
    }

    /// Identity of the request's ticket, validated at most once per request
    ///
    /// Missing, malformed, forged and expired tickets all yield `None`.
    /// Failures are logged and never surfaced to the caller.
    pub async fn get_identity(&self, ctx: &RequestContext) -> Option<Identity> {
        let mut cached = ctx.identity.lock().await;
        if let Some(identity) = cached.as_ref() {
            return identity.clone();
        }

        let identity = self.validate(ctx).await;
        *cached = Some(identity.clone());
        identity
    }

    /// Write a refreshed ticket computed during validation, if any
    ///
    /// Returns whether a ticket was written. The pending ticket is consumed
    /// either way, so a request reissues at most once.
    pub async fn commit_reissue(&self, ctx: &RequestContext) -> Result<bool, AuthError> {
        let pending = ctx.pending_reissue.lock().await.take();

        match pending {
            Some(raw) => {
                ctx.store().put(&raw).await?;
                debug!("Reissued ticket");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop a pending refresh without writing it
    pub async fn discard_reissue(&self, ctx: &RequestContext) {
        if ctx.pending_reissue.lock().await.take().is_some() {
            debug!("Discarded pending ticket reissue");
        }
    }

    async fn validate(&self, ctx: &RequestContext) -> Option<Identity> {
        let raw = match ctx.store().get().await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No ticket present, request is anonymous");
                return None;
            }
            Err(e) => {
                warn!("Could not read ticket store, treating request as anonymous: {}", e);
                return None;
            }
        };

        let client_ip = self.bound_ip(ctx);
        let now = self.clock.now();

        match self.codec.decode(&raw, client_ip, self.max_age, now) {
            Ok(ticket) => {
                if self.needs_reissue(&ticket, now) {
                    match self.codec.encode(&ticket.refreshed(now), client_ip) {
                        Ok(refreshed) => {
                            debug!(
                                "Ticket for '{}' is {}s old, scheduling reissue",
                                ticket.user_id,
                                ticket.age(now)
                            );
                            *ctx.pending_reissue.lock().await = Some(refreshed);
                        }
                        Err(e) => warn!("Failed to refresh ticket: {}", e),
                    }
                }
                Some(Identity::from(ticket))
            }
            Err(TicketError::Expired { age, max_age }) => {
                debug!("Ticket expired ({}s > {}s)", age, max_age);
                None
            }
            Err(e) => {
                warn!(
                    "Rejected ticket: {} (ticket starts with: {}...)",
                    e,
                    raw.chars().take(8).collect::<String>()
                );
                None
            }
        }
    }

    fn needs_reissue(&self, ticket: &Ticket, now: u64) -> bool {
        self.reissue_time
            .is_some_and(|reissue_time| ticket.age(now) > reissue_time)
    }

    fn bound_ip(&self, ctx: &RequestContext) -> Option<IpAddr> {
        if self.include_ip {
            ctx.client_ip()
        } else {
            None
        }
    }
}
