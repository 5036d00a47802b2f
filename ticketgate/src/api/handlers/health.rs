use axum::{debug_handler, extract::State, response::IntoResponse, Json};

use crate::app_state::SharedAppState;

#[debug_handler]
pub async fn health_checker_handler(State(state): State<SharedAppState>) -> impl IntoResponse {
    let json_response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "ticket_storage": format!("{:?}", state.settings.auth.storage).to_lowercase(),
    });

    Json(json_response)
}
