use axum::{
    debug_handler,
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use tracing::info;

use crate::api::error::AppError;
use crate::api::middleware::TicketContext;
use crate::app_state::SharedAppState;

#[derive(Debug, serde::Deserialize, serde::Serialize)]
pub struct ResourceBody {
    pub content: String,
}

#[debug_handler]
pub async fn get_resource_handler(
    State(state): State<SharedAppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let resources = state.resources.read().await;
    let content = resources
        .get(&name)
        .cloned()
        .ok_or_else(|| AppError::ResourceNotFound(name.clone()))?;

    Ok(Json(serde_json::json!({ "name": name, "content": content })))
}

#[debug_handler]
pub async fn put_resource_handler(
    State(state): State<SharedAppState>,
    TicketContext(ctx): TicketContext,
    Path(name): Path<String>,
    Json(body): Json<ResourceBody>,
) -> Result<impl IntoResponse, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput("resource name must not be empty".into()));
    }

    let user = state
        .authenticator
        .get_ticket(&ctx)
        .await
        .unwrap_or_else(|| "anonymous".to_string());

    state
        .resources
        .write()
        .await
        .insert(name.clone(), body.content.clone());
    info!("Resource '{}' updated by {}", name, user);

    Ok(Json(serde_json::json!({ "name": name, "content": body.content })))
}
