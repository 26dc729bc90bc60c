//! Email verification link lifecycle

mod common;

use chrono::{Duration, Utc};
use common::{create_test_app, login, signup};
use serde_json::Value;

#[tokio::test]
async fn test_verification_link_works_once() {
    let app = create_test_app();
    signup(&app.server, "verify@example.com", "password123").await;
    let token = app.email_sender.get_token("verify@example.com").unwrap();
    assert_eq!(token.len(), 64);

    let response = app
        .server
        .get("/verify-email")
        .add_query_param("token", &token)
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let response = app
        .server
        .get("/verify-email")
        .add_query_param("token", &token)
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid or expired token");

    // The account stays verified
    let response = login(&app.server, "verify@example.com", "password123").await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_expired_verification_token_rejected() {
    let app = create_test_app();
    signup(&app.server, "late@example.com", "password123").await;
    let token = app.email_sender.get_token("late@example.com").unwrap();

    app.users
        .set_verification_expiry("late@example.com", Utc::now() - Duration::minutes(1))
        .unwrap();

    let response = app
        .server
        .get("/verify-email")
        .add_query_param("token", &token)
        .await;
    assert_eq!(response.status_code(), 400);

    let response = login(&app.server, "late@example.com", "password123").await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_missing_or_unknown_token() {
    let app = create_test_app();

    let response = app.server.get("/verify-email").await;
    assert_eq!(response.status_code(), 400);

    let response = app
        .server
        .get("/verify-email")
        .add_query_param("token", "deadbeef")
        .await;
    assert_eq!(response.status_code(), 400);
}
