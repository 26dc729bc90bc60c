//! Ticket creation, view access and admin operations

mod common;

use common::{create_admin, create_test_app, create_ticket, create_verified_user, session_cookie};
use serde_json::{json, Value};

fn support_ticket(title: &str) -> Value {
    json!({
        "title": title,
        "description": "The game crashes when loading a save",
        "email": null,
    })
}

#[tokio::test]
async fn test_anonymous_ticket_gets_capability_token() {
    let app = create_test_app();

    let first = create_ticket(&app.server, support_ticket("Crash on load")).await;
    let second = create_ticket(&app.server, support_ticket("Another")).await;

    assert_eq!(first["id"], 1);
    assert_eq!(first["status"], "open");
    assert_eq!(first["ticketType"], "support");
    assert_eq!(first["userId"], Value::Null);
    assert_eq!(first["replies"], json!([]));

    let token = first["viewToken"].as_str().unwrap();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(first["viewToken"], second["viewToken"]);
}

#[tokio::test]
async fn test_ticket_read_requires_token_or_ownership() {
    let app = create_test_app();
    let created = create_ticket(&app.server, support_ticket("Crash on load")).await;
    let token = created["viewToken"].as_str().unwrap().to_string();

    // No token: indistinguishable from a missing ticket
    let denied = app.server.get("/api/tickets/1").await;
    let missing = app.server.get("/api/tickets/999").await;
    assert_eq!(denied.status_code(), 200);
    assert_eq!(denied.json::<Value>(), Value::Null);
    assert_eq!(missing.json::<Value>(), Value::Null);

    let response = app
        .server
        .get("/api/tickets/1")
        .add_query_param("token", "0".repeat(64))
        .await;
    assert_eq!(response.json::<Value>(), Value::Null);

    let response = app
        .server
        .get("/api/tickets/1")
        .add_query_param("token", &token)
        .await;
    let body: Value = response.json();
    assert_eq!(body["id"], 1);
    assert_eq!(body["title"], "Crash on load");
    assert!(body.get("viewToken").is_none());
}

#[tokio::test]
async fn test_owner_and_admin_can_read() {
    let app = create_test_app();
    let owner = create_verified_user(&app, "owner@example.com", "password123").await;
    let other = create_verified_user(&app, "other@example.com", "password123").await;
    let admin = create_admin(&app, "admin@example.com", "adminpassword").await;

    let response = app
        .server
        .post("/api/tickets")
        .add_cookie(session_cookie(&owner))
        .json(&support_ticket("Mine"))
        .await;
    let created: Value = response.json();
    assert_eq!(created["userId"], 1);
    let path = format!("/api/tickets/{}", created["id"]);

    let response = app
        .server
        .get(&path)
        .add_cookie(session_cookie(&owner))
        .await;
    let body: Value = response.json();
    assert_eq!(body["title"], "Mine");
    assert!(body.get("viewToken").is_none());

    let response = app
        .server
        .get(&path)
        .add_cookie(session_cookie(&other))
        .await;
    assert_eq!(response.json::<Value>(), Value::Null);

    let response = app
        .server
        .get(&path)
        .add_cookie(session_cookie(&admin))
        .await;
    let body: Value = response.json();
    assert_eq!(body["title"], "Mine");
    assert!(body.get("viewToken").is_none());
}

#[tokio::test]
async fn test_list_tickets_admin_only() {
    let app = create_test_app();
    let user = create_verified_user(&app, "user@example.com", "password123").await;
    let admin = create_admin(&app, "admin@example.com", "adminpassword").await;
    create_ticket(&app.server, support_ticket("first")).await;
    create_ticket(&app.server, support_ticket("second")).await;

    let response = app.server.get("/api/tickets").await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .server
        .get("/api/tickets")
        .add_cookie(session_cookie(&user))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = app
        .server
        .get("/api/tickets")
        .add_cookie(session_cookie(&admin))
        .await;
    assert_eq!(response.status_code(), 200);
    let tickets: Vec<Value> = response.json();
    let titles: Vec<&str> = tickets.iter().map(|t| t["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["second", "first"]);
    assert!(tickets.iter().all(|t| t.get("viewToken").is_none()));
}

#[tokio::test]
async fn test_create_ticket_validation() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/tickets")
        .json(&json!({ "title": "  ", "description": "x" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = app
        .server
        .post("/api/tickets")
        .json(&json!({ "title": "x", "description": "y", "ticketType": "feature" }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_bug_report_fields() {
    let app = create_test_app();

    let created = create_ticket(
        &app.server,
        json!({
            "title": "Fell through the map",
            "description": "Near the lighthouse",
            "email": "Player@Example.com",
            "ticketType": "bug_report",
            "gameVersion": "1.4.2",
            "platform": "steam_deck",
            "severity": "high",
            "frequency": "always",
            "stepsToReproduce": "Walk into the rocks",
            "expectedBehavior": "Collision",
            "actualBehavior": "Falling",
        }),
    )
    .await;

    assert_eq!(created["ticketType"], "bug_report");
    assert_eq!(created["email"], "player@example.com");
    assert_eq!(created["gameVersion"], "1.4.2");
    assert_eq!(created["stepsToReproduce"], "Walk into the rocks");
    assert_eq!(created["actualBehavior"], "Falling");
}

#[tokio::test]
async fn test_update_status_admin_only() {
    let app = create_test_app();
    let user = create_verified_user(&app, "user@example.com", "password123").await;
    let admin = create_admin(&app, "admin@example.com", "adminpassword").await;
    create_ticket(&app.server, support_ticket("t")).await;

    let response = app
        .server
        .post("/api/tickets/1/status")
        .json(&json!({ "status": "resolved" }))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .server
        .post("/api/tickets/1/status")
        .add_cookie(session_cookie(&user))
        .json(&json!({ "status": "resolved" }))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = app
        .server
        .post("/api/tickets/1/status")
        .add_cookie(session_cookie(&admin))
        .json(&json!({ "status": "escalated" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = app
        .server
        .post("/api/tickets/42/status")
        .add_cookie(session_cookie(&admin))
        .json(&json!({ "status": "closed" }))
        .await;
    assert_eq!(response.status_code(), 404);

    let response = app
        .server
        .post("/api/tickets/1/status")
        .add_cookie(session_cookie(&admin))
        .json(&json!({ "status": "in_progress" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "in_progress");
    assert!(body.get("viewToken").is_none());
}

#[tokio::test]
async fn test_replies_and_admin_flag() {
    let app = create_test_app();
    let admin = create_admin(&app, "admin@example.com", "adminpassword").await;
    let created = create_ticket(&app.server, support_ticket("Help")).await;
    let token = created["viewToken"].as_str().unwrap().to_string();

    // An anonymous caller cannot mark a reply as staff
    let response = app
        .server
        .post("/api/replies")
        .json(&json!({ "ticketId": 1, "content": "Any news?", "isAdmin": true }))
        .await;
    assert_eq!(response.status_code(), 200);
    let reply: Value = response.json();
    assert_eq!(reply["isAdmin"], false);
    assert_eq!(reply["ticketId"], 1);

    let response = app
        .server
        .post("/api/admin/replies")
        .json(&json!({ "ticketId": 1, "content": "Spoofed" }))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = app
        .server
        .post("/api/admin/replies")
        .add_cookie(session_cookie(&admin))
        .json(&json!({ "ticketId": 1, "content": "We're on it" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let reply: Value = response.json();
    assert_eq!(reply["isAdmin"], true);

    let response = app
        .server
        .get("/api/tickets/1")
        .add_query_param("token", &token)
        .await;
    let body: Value = response.json();
    let replies = body["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["content"], "Any news?");
    assert_eq!(replies[1]["content"], "We're on it");
    assert_eq!(replies[1]["isAdmin"], true);
}

#[tokio::test]
async fn test_reply_validation() {
    let app = create_test_app();

    let response = app
        .server
        .post("/api/replies")
        .json(&json!({ "ticketId": 7, "content": "hello" }))
        .await;
    assert_eq!(response.status_code(), 404);

    create_ticket(&app.server, support_ticket("t")).await;
    let response = app
        .server
        .post("/api/replies")
        .json(&json!({ "ticketId": 1, "content": "   " }))
        .await;
    assert_eq!(response.status_code(), 400);
}
