use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::Context;
use tokio::sync::RwLock;
use tracing::info;
use ticketgate_core::auth::TicketAuthenticator;
use ticketgate_core::authorization::GroupResolver;

use crate::api::stores::MemorySessionBackend;
use crate::services::ConfiguredGroups;
use crate::settings::config::Settings;
use crate::stop_flag;

/// Documents served by the ACL-protected resource routes
pub type ResourceMap = Arc<RwLock<HashMap<String, String>>>;

#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Settings,
    pub stop_flag: stop_flag::StopFlag,
    pub authenticator: TicketAuthenticator,
    pub resolver: GroupResolver,
    pub sessions: MemorySessionBackend,
    pub resources: ResourceMap,
}

pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<SharedAppState> {
        let stop_flag = stop_flag::StopFlag::new();
        stop_flag::register_signal_handler(&stop_flag);

        Self::from_settings(settings, stop_flag)
    }

    /// Wire up authentication and authorization from already loaded settings
    pub fn from_settings(
        settings: Settings,
        stop_flag: stop_flag::StopFlag,
    ) -> anyhow::Result<SharedAppState> {
        let authenticator = TicketAuthenticator::from_settings(&settings.auth)
            .context("Invalid ticket settings")?;

        let mut resolver = GroupResolver::new(Arc::new(ConfiguredGroups::from_settings(&settings)));
        if let Some(timeout_ms) = settings.authorization.groups_timeout_ms {
            resolver = resolver.with_timeout(Duration::from_millis(timeout_ms));
        }

        let sessions = MemorySessionBackend::new(Duration::from_secs(settings.auth.max_age));

        info!(
            "Ticket authentication ready: storage={:?}, algorithm={}, max_age={}s, reissue_time={:?}, {} user(s), {} ACL entries",
            settings.auth.storage,
            authenticator.codec().algorithm().as_str(),
            settings.auth.max_age,
            settings.auth.reissue_time,
            settings.users.len(),
            settings.authorization.acl.len()
        );

        Ok(Arc::new(AppState {
            settings,
            stop_flag,
            authenticator,
            resolver,
            sessions,
            resources: Arc::new(RwLock::new(HashMap::new())),
        }))
    }
}
