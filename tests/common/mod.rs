//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::Router;
use axum_test::TestServer;
use serde_json::{json, Value};
use timetrack::api;
use timetrack::config::{AuthConfig, Config, DatabaseConfig, ServerConfig};
use timetrack::db::{self, DbPool};
use timetrack::services::{Clock, SystemClock};
use timetrack::AppState;

/// Create a Bearer Authorization header value
pub fn bearer_auth(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            path: ":memory:".into(),
        },
        auth: AuthConfig {
            jwt_secret: "integration-test-secret".into(),
            jwt_expires_in: Duration::from_secs(3600),
        },
    }
}

/// Create an in-memory test database with the schema applied
pub async fn setup_test_db() -> DbPool {
    let pool = db::init_pool(":memory:")
        .await
        .expect("Failed to create test database");
    db::initialize_schema(&pool)
        .await
        .expect("Failed to initialize schema");
    pool
}

/// Build a test server over the full router
pub async fn build_test_app() -> (TestServer, DbPool) {
    build_test_app_with_clock(Arc::new(SystemClock)).await
}

pub async fn build_test_app_with_clock(clock: Arc<dyn Clock>) -> (TestServer, DbPool) {
    let pool = setup_test_db().await;
    let state = AppState::from_parts(pool.clone(), &test_config(), clock);

    let app = Router::new()
        .merge(api::routes(state.clone()))
        .with_state(state);

    let server = TestServer::new(app).expect("Failed to create test server");

    (server, pool)
}

/// Register a user and return their token
pub async fn register(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123",
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: Value = response.json();
    body["token"].as_str().expect("token in response").to_string()
}

/// Create a project and return its JSON
pub async fn create_project(server: &TestServer, token: &str, name: &str) -> Value {
    let response = server
        .post("/api/projects")
        .add_header(axum::http::header::AUTHORIZATION, bearer_auth(token))
        .json(&json!({ "name": name }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}
