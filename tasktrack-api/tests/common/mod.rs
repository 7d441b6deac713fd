/// Common test utilities for API tests
///
/// Builds the real router over an in-memory store, so the full HTTP stack
/// (guard, extractors, error mapping, headers) runs without a database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tasktrack_api::app::{build_router, AppState};
use tasktrack_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use tasktrack_shared::models::user::NewUser;
use tasktrack_shared::store::MemoryStore;
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// A strong password accepted by registration
pub const STRONG_PASSWORD: &str = "Str0ng!Passw0rd";

/// Test context with a fresh store and router
pub struct TestContext {
    pub app: axum::Router,
    pub state: AppState,
}

/// Status, headers and parsed JSON body (Null when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub fn test_config() -> Config {
    Config {
        app_name: "Task Management API".to_string(),
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
            acquire_timeout_seconds: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expire_minutes: 30,
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), test_config());
        let app = build_router(state.clone());
        Self { app, state }
    }

    /// Sends a request, optionally authenticated and with a JSON body
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("Non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::PATCH, uri, Some(token), None).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Creates a user directly in the store and returns a bearer token
    ///
    /// Skips password hashing; use the register/login endpoints to exercise it.
    pub async fn user(&self, username: &str) -> String {
        let user = self
            .state
            .store
            .insert_user(
                NewUser {
                    username: username.to_string(),
                    email: format!("{}@example.com", username),
                    password_hash: "unused".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        self.state.tokens.issue(user.id, Utc::now()).unwrap().token
    }

    /// Creates a task and returns its JSON
    pub async fn task(&self, token: &str, body: Value) -> Value {
        let response = self.post("/v1/tasks", token, body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }

    /// Creates a project and returns its JSON
    pub async fn project(&self, token: &str, body: Value) -> Value {
        let response = self.post("/v1/projects", token, body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }
}

/// Titles of a JSON task list, in order
pub fn titles(body: &Value) -> Vec<String> {
    body.as_array()
        .expect("Expected a JSON array")
        .iter()
        .map(|task| task["title"].as_str().unwrap().to_string())
        .collect()
}
