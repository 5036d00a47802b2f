use axum::{debug_handler, extract::State, response::IntoResponse, Json};
use tracing::{debug, warn};

use crate::api::error::AppError;
use crate::api::middleware::TicketContext;
use crate::app_state::SharedAppState;

#[derive(Debug, serde::Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

/// Check the password and issue a ticket for the user
#[debug_handler]
pub async fn login_handler(
    State(state): State<SharedAppState>,
    TicketContext(ctx): TicketContext,
    Json(form): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Login attempt for user '{}'", form.user_id);

    let Some(user) = state.settings.users.get(&form.user_id) else {
        warn!("Login failed: unknown user '{}'", form.user_id);
        return Err(AppError::InvalidCredentials);
    };

    let password = form.password;
    let password_hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    match verified {
        Ok(true) => {}
        Ok(false) => {
            warn!("Login failed: wrong password for user '{}'", form.user_id);
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => {
            warn!(
                "Login failed: unusable password hash for user '{}': {}",
                form.user_id, e
            );
            return Err(AppError::InvalidCredentials);
        }
    }

    state
        .authenticator
        .remember(&ctx, &form.user_id, &user.user_data)
        .await?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "user_id": form.user_id,
    })))
}

/// Clear the ticket, succeeds for anonymous callers too
#[debug_handler]
pub async fn logout_handler(
    State(state): State<SharedAppState>,
    TicketContext(ctx): TicketContext,
) -> Result<impl IntoResponse, AppError> {
    state.authenticator.forget(&ctx).await?;

    Ok(Json(serde_json::json!({ "status": "success" })))
}
