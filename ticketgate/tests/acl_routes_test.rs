mod common;

use axum_test::TestServer;
use common::*;
use ticketgate_core::auth::ManualClock;
use ticketgate_core::ticket::Ticket;

async fn put_resource(server: &TestServer, ticket: Option<&str>, content: &str) -> u16 {
    let mut request = server
        .put("/api/v1/resources/handbook")
        .json(&serde_json::json!({ "content": content }));
    if let Some(ticket) = ticket {
        let (name, value) = cookie("AUTH_TKT", ticket);
        request = request.add_header(name, value);
    }
    request.await.status_code().as_u16()
}

async fn get_resource(server: &TestServer, ticket: Option<&str>) -> u16 {
    let mut request = server.get("/api/v1/resources/handbook");
    if let Some(ticket) = ticket {
        let (name, value) = cookie("AUTH_TKT", ticket);
        request = request.add_header(name, value);
    }
    request.await.status_code().as_u16()
}

/// Editors may write, authenticated users may read, everyone else is denied
#[tokio::test]
async fn test_acl_guards_resource_routes() {
    let clock = ManualClock::new(START);
    let server = test_server(test_app_state(test_settings(&[]), &clock));
    let alice = login_ticket(&server, "alice").await;
    let bob = login_ticket(&server, "bob").await;

    assert_eq!(put_resource(&server, None, "anonymous").await, 403);
    assert_eq!(get_resource(&server, None).await, 403);

    assert_eq!(put_resource(&server, Some(&bob), "from bob").await, 403);
    assert_eq!(get_resource(&server, Some(&bob)).await, 404);

    assert_eq!(put_resource(&server, Some(&alice), "from alice").await, 200);
    assert_eq!(get_resource(&server, Some(&bob)).await, 200);

    let (name, value) = cookie("AUTH_TKT", &bob);
    let response = server
        .get("/api/v1/resources/handbook")
        .add_header(name, value)
        .await;
    let json: serde_json::Value = response.json();
    assert_eq!(json["content"], "from alice");
}

/// An earlier user deny beats a later group allow
#[tokio::test]
async fn test_first_matching_entry_decides() {
    let clock = ManualClock::new(START);
    let server = test_server(test_app_state(test_settings(&[]), &clock));
    let mallory = login_ticket(&server, "mallory").await;

    assert_eq!(put_resource(&server, Some(&mallory), "defaced").await, 403);
    assert_eq!(get_resource(&server, Some(&mallory)).await, 404);

    let (name, value) = cookie("AUTH_TKT", &mallory);
    let response = server
        .put("/api/v1/resources/handbook")
        .add_header(name, value)
        .json(&serde_json::json!({ "content": "defaced" }))
        .await;
    let json: serde_json::Value = response.json();
    assert_eq!(json["error"], true);
    assert_eq!(json["message"], "Permission 'edit' denied");
}

/// A valid ticket for a user the server has no groups for is denied
#[tokio::test]
async fn test_unknown_user_ticket_gets_no_permissions() {
    let clock = ManualClock::new(START);
    let app_state = test_app_state(test_settings(&[]), &clock);
    let server = test_server(app_state.clone());

    let ghost = app_state
        .authenticator
        .codec()
        .encode(&Ticket::new("ghost", "", START), None)
        .unwrap();

    let (name, value) = cookie("AUTH_TKT", &ghost);
    let response = server.get("/api/v1/whoami").add_header(name, value).await;
    assert_eq!(response.status_code(), 200);
    let json: serde_json::Value = response.json();
    assert_eq!(json["user_id"], "ghost");
    assert_eq!(json["groups"], serde_json::Value::Null);

    assert_eq!(get_resource(&server, Some(&ghost)).await, 403);
}

/// Groups for anonymous callers come from the configuration
#[tokio::test]
async fn test_anonymous_groups_open_read_access() {
    let clock = ManualClock::new(START);
    let mut settings = test_settings(&[]);
    settings.authorization = serde_norway::from_str(
        r#"
anonymous_groups: ["guests"]
acl:
  - effect: allow
    principal: "guests"
    permissions: ["view"]
  - effect: deny
    principal: "system.Everyone"
    permissions: ["view", "edit"]
"#,
    )
    .unwrap();
    let server = test_server(test_app_state(settings, &clock));

    assert_eq!(get_resource(&server, None).await, 404);
    assert_eq!(put_resource(&server, None, "anonymous").await, 403);

    let response = server.get("/api/v1/groups").await;
    let json: serde_json::Value = response.json();
    assert_eq!(json["groups"], serde_json::json!(["guests", "system.Everyone"]));

    // Logged in users lose the anonymous groups
    let bob = login_ticket(&server, "bob").await;
    assert_eq!(get_resource(&server, Some(&bob)).await, 403);
}
