//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use epri_core::clock::Clock;
use epri_core::rng::{OsEntropy, SessionEntropy};
use epri_visit_store::pg_visit_repository::PgVisitRepository;
use epri_test_support::FixedClock;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use epri_api::routes;
use epri_api::state::AppState;

/// Admin token configured on every test app.
pub const ADMIN_TOKEN: &str = "integration-admin-token";

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router with a real `PgVisitRepository`, a fixed clock
/// and OS entropy. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let entropy: Arc<Mutex<dyn SessionEntropy + Send>> = Arc::new(Mutex::new(OsEntropy));
    let visit_repository = Arc::new(PgVisitRepository::new(pool));
    let app_state = AppState::new(fixed_clock(), entropy, visit_repository)
        .with_admin_token(Some(ADMIN_TOKEN.to_string()))
        .with_error_detail(true);

    routes::app(app_state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send an empty POST request carrying the admin bearer token.
pub async fn post_admin(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}
