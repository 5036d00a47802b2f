use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;

use crate::app_state::SharedAppState;

use super::handlers::health::health_checker_handler;
use super::handlers::login::{login_handler, logout_handler};
use super::handlers::resources::{get_resource_handler, put_resource_handler};
use super::handlers::whoami::{groups_handler, whoami_handler};
use super::middleware::{require_auth, require_permission, ticket_middleware};

pub struct ApiRoutes;

impl ApiRoutes {
    pub fn create(state: SharedAppState) -> Router {
        let authenticated_router = Router::new()
            .route("/api/v1/whoami", get(whoami_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

        let resources = get(get_resource_handler)
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_permission("view"),
            ))
            .merge(put(put_resource_handler).route_layer(
                middleware::from_fn_with_state(state.clone(), require_permission("edit")),
            ));

        Router::new()
            .route("/api/v1/health", get(health_checker_handler))
            .route("/api/v1/login", post(login_handler))
            .route("/api/v1/logout", post(logout_handler))
            .route("/api/v1/groups", get(groups_handler))
            .route("/api/v1/resources/{name}", resources)
            .merge(authenticated_router)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                ticket_middleware,
            ))
            .with_state(state)
    }
}
