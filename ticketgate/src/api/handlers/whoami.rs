use axum::{debug_handler, extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::api::error::AppError;
use crate::api::middleware::TicketContext;
use crate::app_state::SharedAppState;
use ticketgate_core::authorization::GroupSet;

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user_id: String,
    pub user_data: String,
    pub groups: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub user_id: Option<String>,
    /// `None` when group membership could not be determined
    pub groups: Option<Vec<String>>,
}

fn sorted_names(groups: Option<GroupSet>) -> Option<Vec<String>> {
    groups.map(|groups| {
        let mut names: Vec<String> = groups.into_iter().map(String::from).collect();
        names.sort();
        names
    })
}

/// Identity of the authenticated caller
#[debug_handler]
pub async fn whoami_handler(
    State(state): State<SharedAppState>,
    TicketContext(ctx): TicketContext,
) -> Result<impl IntoResponse, AppError> {
    let identity = state
        .authenticator
        .get_identity(&ctx)
        .await
        .ok_or(AppError::Unauthorized)?;

    let groups = state.resolver.resolve(&ctx, Some(&identity.user_id)).await;

    Ok(Json(WhoamiResponse {
        user_id: identity.user_id,
        user_data: identity.user_data,
        groups: sorted_names(groups),
    }))
}

/// Effective groups of the caller, anonymous or not
#[debug_handler]
pub async fn groups_handler(
    State(state): State<SharedAppState>,
    TicketContext(ctx): TicketContext,
) -> impl IntoResponse {
    let user_id = state.authenticator.get_ticket(&ctx).await;
    let groups = state.resolver.resolve(&ctx, user_id.as_deref()).await;

    Json(GroupsResponse {
        user_id,
        groups: sorted_names(groups),
    })
}
