//! Shared helpers for HTTP-level tests
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tower::util::ServiceExt; // for `oneshot`

use fiscus::bootstrap::AppInfo;
use fiscus::{build_router, db, AppState};

/// Signed ledger fixture: five `test-signature` entries (one with header
/// overrides) and one under signature `xxx`, all in February 2020
pub const TRANSACTIONS_FIXTURE: &str = include_str!("../fixtures/test_transactions.json");

/// Build the application against a fresh in-memory database
pub async fn setup_app() -> Router {
    let pool = db::memory_pool().await.expect("memory pool");
    db::install(&pool).await.expect("schema install");

    build_router(AppState::new(pool, 10, AppInfo::default()))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn head(uri: &str) -> Request<Body> {
    Request::builder()
        .method("HEAD")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post(uri: &str, payload: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("request")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn header_value(response: &Response<Body>, name: &str) -> String {
    response
        .headers()
        .get(name)
        .map(|value| value.to_str().unwrap_or_default().to_string())
        .unwrap_or_default()
}
