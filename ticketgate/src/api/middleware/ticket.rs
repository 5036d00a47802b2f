use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use ticketgate_core::auth::TicketStore;
use ticketgate_core::context::{RequestContext, SharedRequestContext};
use ticketgate_core::settings::TicketStorage;

use crate::api::cookies::ResponseCookies;
use crate::api::error::AppError;
use crate::api::stores::{CookieTicketStore, SessionTicketStore};
use crate::app_state::SharedAppState;

/// Binds a `RequestContext` to every request
///
/// A refreshed ticket computed while handling the request is only written
/// when the handler answered with a 2xx status.
pub async fn ticket_middleware(
    State(state): State<SharedAppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let cookies = ResponseCookies::default();
    let auth = &state.settings.auth;

    let store: Arc<dyn TicketStore> = match auth.storage {
        TicketStorage::Cookie => Arc::new(CookieTicketStore::from_request(
            auth,
            req.headers(),
            cookies.clone(),
        )),
        TicketStorage::Session => Arc::new(SessionTicketStore::from_request(
            state.sessions.clone(),
            auth,
            req.headers(),
            cookies.clone(),
        )),
    };

    let client_ip = client_ip(&req, state.settings.api.trust_forwarded_for);
    let ctx = RequestContext::new(store)
        .with_client_ip(client_ip)
        .into_shared();
    req.extensions_mut().insert(ctx.clone());

    let mut response = next.run(req).await;

    if response.status().is_success() {
        if let Err(e) = state.authenticator.commit_reissue(&ctx).await {
            warn!("Failed to write reissued ticket: {}", e);
        }
    } else {
        state.authenticator.discard_reissue(&ctx).await;
    }

    for cookie in cookies.take().await {
        match HeaderValue::from_str(&cookie.to_header_value()) {
            Ok(value) => {
                debug!("Setting cookie '{}'", cookie.name());
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("Skipping cookie '{}' with invalid value: {}", cookie.name(), e),
        }
    }

    response
}

/// Client address of the request
///
/// The first `X-Forwarded-For` entry wins when the server runs behind a
/// trusted proxy, otherwise the peer address is used if known.
pub fn client_ip(req: &Request, trust_forwarded_for: bool) -> Option<IpAddr> {
    if trust_forwarded_for {
        if let Some(ip) = forwarded_for(req.headers()) {
            return Some(ip);
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|ip| ip.trim().parse().ok())
}

/// Extractor for the request's `RequestContext`
///
/// Fails with a server error on routes without `ticket_middleware`.
#[derive(Debug, Clone)]
pub struct TicketContext(pub SharedRequestContext);

impl<S> FromRequestParts<S> for TicketContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SharedRequestContext>()
            .cloned()
            .map(TicketContext)
            .ok_or_else(|| {
                warn!("Request context missing, is ticket_middleware installed?");
                AppError::MiddlewareMissing
            })
    }
}
