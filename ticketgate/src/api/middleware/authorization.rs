use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, info, warn};
use ticketgate_core::authorization::get_permitted;

use super::ticket::TicketContext;
use crate::api::error::AppError;
use crate::app_state::SharedAppState;

/// Middleware rejecting requests without a valid ticket
pub async fn require_auth(
    State(state): State<SharedAppState>,
    TicketContext(ctx): TicketContext,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    match state.authenticator.get_ticket(&ctx).await {
        Some(user_id) => {
            debug!("Request authenticated as '{}'", user_id);
            Ok(next.run(req).await)
        }
        None => {
            debug!("Anonymous request to {} {} rejected", req.method(), req.uri());
            Err(AppError::Unauthorized)
        }
    }
}

/// Middleware factory checking `permission` against the configured ACL
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(
    State<SharedAppState>,
    TicketContext,
    Request,
    Next,
) -> Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>
       + Clone {
    move |State(state): State<SharedAppState>,
          TicketContext(ctx): TicketContext,
          req: Request,
          next: Next| {
        Box::pin(async move {
            let allowed = get_permitted(
                &ctx,
                &state.authenticator,
                &state.resolver,
                permission,
                &state.settings.authorization.acl,
            )
            .await;

            let user = state
                .authenticator
                .get_ticket(&ctx)
                .await
                .unwrap_or_else(|| "anonymous".to_string());

            if !allowed {
                warn!("Access denied: {} cannot {} {}", user, permission, req.uri());
                return Err(AppError::Forbidden(permission.to_string()));
            }

            info!("Access granted: {} can {} {}", user, permission, req.uri());
            Ok(next.run(req).await)
        })
    }
}
