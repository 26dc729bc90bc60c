//! Common test utilities for desk integration tests

use std::sync::Arc;
use std::sync::RwLock;

use axum_test::TestServer;
use chrono::Utc;
use serde_json::{json, Value};
use studiodesk_server::{
    accounts, routes, AppState, EmailSender, InMemoryTicketStore, InMemoryUpdateStore,
    InMemoryUserStore, PasswordHasher, SessionGate,
};

pub const SESSION_COOKIE: &str = "studiodesk_session";
pub const BASE_URL: &str = "http://localhost:8910";

/// Cheapest bcrypt cost, to keep tests fast
pub fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(4)
}

/// Mock email sender that captures links
#[derive(Default, Clone)]
pub struct MockEmailSender {
    /// Captured (email, link) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the last link sent to an email
    pub fn get_link(&self, email: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, link)| link.clone())
    }

    /// Token carried by the last link sent to an email
    pub fn get_token(&self, email: &str) -> Option<String> {
        self.get_link(email)
            .and_then(|link| link.rsplit_once('=').map(|(_, token)| token.to_string()))
    }

    pub fn count(&self) -> usize {
        self.sent.read().unwrap().len()
    }
}

impl EmailSender for MockEmailSender {
    fn send_verification(&self, email: &str, link: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((email.to_string(), link.to_string()));
        Ok(())
    }

    fn send_password_reset(&self, email: &str, link: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((email.to_string(), link.to_string()));
        Ok(())
    }
}

/// A running test server plus handles into its backends
pub struct TestApp {
    pub server: TestServer,
    pub email_sender: MockEmailSender,
    pub users: Arc<InMemoryUserStore>,
}

/// Create a test server with in-memory stores and a mock email sender
pub fn create_test_app() -> TestApp {
    let email_sender = MockEmailSender::new();
    let users = Arc::new(InMemoryUserStore::new());

    let state = Arc::new(AppState::new(
        Arc::clone(&users),
        InMemoryTicketStore::new(),
        InMemoryUpdateStore::new(),
        email_sender.clone(),
        SessionGate::new("integration-test-secret", false).unwrap(),
        test_hasher(),
        BASE_URL,
    ));

    let app = routes::create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        email_sender,
        users,
    }
}

pub fn session_cookie(value: &str) -> cookie::Cookie<'static> {
    cookie::Cookie::new(SESSION_COOKIE, value.to_string())
}

pub async fn signup(server: &TestServer, email: &str, password: &str) -> axum_test::TestResponse {
    server
        .post("/auth")
        .json(&json!({
            "method": "signup",
            "username": email,
            "password": password,
        }))
        .await
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> axum_test::TestResponse {
    server
        .post("/auth")
        .json(&json!({
            "method": "login",
            "username": email,
            "password": password,
        }))
        .await
}

/// Log in and return the session cookie value
pub async fn login_cookie(server: &TestServer, email: &str, password: &str) -> String {
    let response = login(server, email, password).await;
    assert_eq!(response.status_code(), 200);

    response
        .maybe_cookie(SESSION_COOKIE)
        .expect("No session cookie")
        .value()
        .to_string()
}

/// Sign up, follow the verification link and log in; returns the session cookie
pub async fn create_verified_user(app: &TestApp, email: &str, password: &str) -> String {
    let response = signup(&app.server, email, password).await;
    assert_eq!(response.status_code(), 200);

    let token = app
        .email_sender
        .get_token(email)
        .expect("No verification email sent");

    let response = app
        .server
        .get("/verify-email")
        .add_query_param("token", &token)
        .await;
    assert_eq!(response.status_code(), 200);

    login_cookie(&app.server, email, password).await
}

/// Provision an admin out of band and log in; returns the session cookie
pub async fn create_admin(app: &TestApp, email: &str, password: &str) -> String {
    accounts::provision_admin(
        app.users.as_ref(),
        &test_hasher(),
        email,
        password,
        Utc::now(),
    )
    .unwrap();

    login_cookie(&app.server, email, password).await
}

/// File a ticket and return the response body
pub async fn create_ticket(server: &TestServer, body: Value) -> Value {
    let response = server.post("/api/tickets").json(&body).await;
    assert_eq!(response.status_code(), 200);
    response.json()
}
