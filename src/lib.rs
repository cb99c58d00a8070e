//! fiscus library - personal-finance transaction service
//!
//! Ingests signed transaction ledgers over HTTP, persists them in a
//! relational store and derives a per-party categorization model per ledger
//! signature: label prediction for new records plus graded near-duplicate
//! detection against stored history.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::get;
use axum::Router;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod journal;
pub mod restore;

pub use error::{Error, Result};

use bootstrap::AppInfo;
use journal::JournalEntry;

/// Application state shared across HTTP handlers
///
/// Owns the two process-local caches: the registry route cache (URL →
/// serialized response) and the journal signature cache (signature →
/// records + tendency). Each sits behind its own reader/writer lock and is
/// threaded through handlers by construction.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Batch limit for store reads and writes
    pub batch: i64,
    /// Registry route cache, emptied wholesale on any transaction write
    pub routes: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    /// Journal signature cache, entries replaced wholesale per evaluate
    pub journal: Arc<RwLock<HashMap<String, JournalEntry>>>,
    /// Bootstrap state snapshot taken at boot
    pub boot: Arc<AppInfo>,
    /// Process start, for the runtime snapshot
    pub started: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, batch: i64, boot: AppInfo) -> Self {
        Self {
            db,
            batch,
            routes: Arc::new(RwLock::new(HashMap::new())),
            journal: Arc::new(RwLock::new(HashMap::new())),
            boot: Arc::new(boot),
            started: Instant::now(),
        }
    }
}

/// Build the application router
///
/// The process healthcheck lives on `/`; everything else sits under the
/// `/v0` prefix.
pub fn build_router(state: AppState) -> Router {
    let v0 = Router::new()
        .route(
            "/registry/actors",
            get(api::registry::read_actors).post(api::registry::write_actors),
        )
        .route(
            "/registry/labels",
            get(api::registry::read_labels).post(api::registry::write_labels),
        )
        .route(
            "/registry/transactions",
            get(api::registry::read_transactions).post(api::registry::write_transactions),
        )
        .route(
            "/registry/transactions/:year/:month",
            get(api::registry::read_monthly_transactions),
        )
        .route(
            "/journal/:signature",
            get(api::journal::evaluate).post(api::journal::analyze),
        )
        .route("/journal/:signature/download", get(api::journal::download));

    Router::new()
        .route("/", get(api::status::status))
        .nest("/v0", v0)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
