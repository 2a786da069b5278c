#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum_test::TestServer;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use officehours_api::{app, ApiState};
use officehours_core::{
    memory::InMemoryStore,
    notify::{spawn_worker, LogMailer, Mailer},
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "Secret@123";
pub const JWT_SECRET: &str = "test-secret";

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<InMemoryStore>,
    worker: JoinHandle<()>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_mailer(Arc::new(LogMailer))
    }

    pub fn with_mailer(mailer: Arc<dyn Mailer>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let (notifications, worker) = spawn_worker(mailer, 64);
        let state = Arc::new(ApiState::new(store.clone(), notifications, JWT_SECRET, 24));
        let server = TestServer::new(app(state)).expect("Failed to start test server");

        Self {
            server,
            store,
            worker,
        }
    }

    /// Shuts the server down and waits for pending notifications.
    pub async fn finish(self) {
        let TestApp { server, worker, .. } = self;
        drop(server);
        worker.await.expect("Notification worker panicked");
    }

    /// Registers a user and returns its id.
    pub async fn register(&self, username: &str, is_professor: bool) -> i64 {
        let response = self
            .server
            .post("/api/users")
            .json(&json!({
                "username": username,
                "email": format!("{}@test.com", username.to_lowercase()),
                "password": PASSWORD,
                "is_professor": is_professor,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["data"]["id"]
            .as_i64()
            .expect("registered user has an id")
    }

    pub async fn login(&self, username: &str) -> String {
        let response = self
            .server
            .post("/api/users/login")
            .json(&json!({ "username": username, "password": PASSWORD }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["data"]["auth_token"]
            .as_str()
            .expect("login returns a token")
            .to_string()
    }

    /// Registers and logs a user in, returning `(id, token)`.
    pub async fn signed_in(&self, username: &str, is_professor: bool) -> (i64, String) {
        let id = self.register(username, is_professor).await;
        let token = self.login(username).await;
        (id, token)
    }

    /// Publishes a slot `hours` from now and returns its id.
    pub async fn publish_slot(&self, token: &str, hours: i64) -> i64 {
        let response = self
            .server
            .post("/api/slots")
            .add_header(bearer_name(), bearer(token))
            .json(&json!({ "slot": rfc3339_in(hours) }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["data"]["id"]
            .as_i64()
            .expect("created slot has an id")
    }
}

pub fn bearer_name() -> HeaderName {
    AUTHORIZATION
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).expect("token is a valid header value")
}

pub fn rfc3339_in(hours: i64) -> String {
    at(Utc::now() + Duration::hours(hours))
}

pub fn at(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Secs, true)
}
