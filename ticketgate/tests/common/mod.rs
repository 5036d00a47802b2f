#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{header::COOKIE, HeaderName, HeaderValue};
use axum_test::{TestResponse, TestServer};
use config::Config;
use ticketgate::api::router::ApiRoutes;
use ticketgate::app_state::{AppState, SharedAppState};
use ticketgate::settings::config::Settings;
use ticketgate::stop_flag::StopFlag;
use ticketgate_core::auth::ManualClock;

pub const START: u64 = 1_700_000_000;
pub const TEST_CONFIG: &str = "tests/test_ticketgate";

pub fn password_for(user_id: &str) -> String {
    format!("{user_id}-password")
}

/// Load the test config, hash every user's password and apply `overrides`
pub fn test_settings(overrides: &[(&str, &str)]) -> Settings {
    let mut builder = Config::builder().add_source(config::File::with_name(TEST_CONFIG));

    for user_id in ["alice", "bob", "mallory"] {
        let hash = bcrypt::hash(password_for(user_id), 4).unwrap();
        builder = builder
            .set_override(format!("users.{user_id}.password_hash"), hash)
            .unwrap();
    }
    for (key, value) in overrides {
        builder = builder.set_override(*key, *value).unwrap();
    }

    let settings: Settings = builder.build().unwrap().try_deserialize().unwrap();
    settings.validate().unwrap();
    settings
}

/// App state whose authenticator reads time from `clock`
pub fn test_app_state(settings: Settings, clock: &ManualClock) -> SharedAppState {
    let app_state = AppState::from_settings(settings, StopFlag::new()).unwrap();

    let mut app_state = (*app_state).clone();
    app_state.authenticator = app_state
        .authenticator
        .clone()
        .with_clock(Arc::new(clock.clone()));
    Arc::new(app_state)
}

pub fn test_server(app_state: SharedAppState) -> TestServer {
    TestServer::new(ApiRoutes::create(app_state)).unwrap()
}

/// All `Set-Cookie` headers of a response
pub fn set_cookies(response: &TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Value a response assigns to cookie `name`, if it sets it
pub fn set_cookie_value(response: &TestResponse, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|header| {
        let pair = header.split(';').next()?.to_string();
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

pub fn cookie(name: &str, value: &str) -> (HeaderName, HeaderValue) {
    (
        COOKIE,
        HeaderValue::from_str(&format!("{name}={value}")).unwrap(),
    )
}

pub async fn login(server: &TestServer, user_id: &str) -> TestResponse {
    server
        .post("/api/v1/login")
        .json(&serde_json::json!({
            "user_id": user_id,
            "password": password_for(user_id),
        }))
        .await
}

/// Log in and return the ticket cookie value
pub async fn login_ticket(server: &TestServer, user_id: &str) -> String {
    let response = login(server, user_id).await;
    assert_eq!(response.status_code(), 200);
    set_cookie_value(&response, "AUTH_TKT").unwrap()
}
