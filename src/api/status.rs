//! Process healthcheck
//!
//! `GET /` answers a two-element JSON array: the persisted bootstrap state
//! followed by a live runtime snapshot.

use std::time::Instant;

use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::api::response;
use crate::AppState;

/// Live snapshot reported next to the persisted process state
#[derive(Debug, Serialize)]
pub struct Introspection {
    /// Empty when the store answers a ping
    pub troubleshoot: String,
    pub process_id: u32,
    pub uptime_seconds: u64,
    pub version: String,
}

/// GET /
pub async fn status(State(state): State<AppState>) -> Response {
    let started = Instant::now();

    let troubleshoot = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => String::new(),
        Err(e) => format!("database ping error: {e}"),
    };

    let snapshot = Introspection {
        troubleshoot,
        process_id: std::process::id(),
        uptime_seconds: state.started.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    match serde_json::to_vec(&serde_json::json!([&*state.boot, snapshot])) {
        Ok(out) => response::okay(out, false, started.elapsed()),
        Err(e) => response::fault(e),
    }
}
