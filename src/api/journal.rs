//! Journal HTTP surface
//!
//! HEAD and GET rebuild the signature's model (HEAD primes the cache without
//! a body); POST scores candidate records against the cached model and the
//! overlapping stored history; download streams the cached record list as
//! CSV.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;

use crate::api::response;
use crate::db;
use crate::journal::{self, Record};
use crate::AppState;

/// Signature pattern accepted by the journal routes
fn valid_signature(signature: &str) -> bool {
    !signature.is_empty()
        && signature
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'-'))
}

/// HEAD/GET /v0/journal/{signature}
///
/// Rebuilds the cache entry and returns the tendency model as JSON (an empty
/// object when nothing was cached). HEAD requests run the same evaluation;
/// the transport drops the body.
pub async fn evaluate(State(state): State<AppState>, Path(signature): Path<String>) -> Response {
    let started = Instant::now();

    if !valid_signature(&signature) {
        return response::missing();
    }

    if let Err(e) = journal::evaluate(&state, &signature).await {
        return response::fault(e);
    }

    let cache = state.journal.read().await;
    match cache.get(&signature) {
        Some(entry) => match serde_json::to_vec(&entry.patterns) {
            Ok(out) => response::okay(out, false, started.elapsed()),
            Err(e) => response::fault(e),
        },
        None => response::okay(b"{}".to_vec(), false, started.elapsed()),
    }
}

/// POST /v0/journal/{signature}
///
/// Body is a JSON array of candidate records. The reply enriches each
/// candidate with `$calculated` label scores and `$similarity` grades
/// against stored transactions inside the candidates' date window.
pub async fn analyze(
    State(state): State<AppState>,
    Path(signature): Path<String>,
    payload: Bytes,
) -> Response {
    let started = Instant::now();

    if !valid_signature(&signature) {
        return response::missing();
    }

    let mut candidates: Vec<Record> = match serde_json::from_slice(&payload) {
        Ok(candidates) => candidates,
        Err(e) => return response::wrong(e),
    };

    if candidates.is_empty() {
        return response::okay(b"[]".to_vec(), false, started.elapsed());
    }

    candidates.sort_by(|a, b| b.date.cmp(&a.date));
    let newest = candidates[0].date;
    let oldest = candidates[candidates.len() - 1].date;

    let stored = match db::transactions::pull_by_signature_between(
        &state.db,
        &signature,
        oldest,
        newest,
        state.batch,
    )
    .await
    {
        Ok(stored) => stored,
        Err(e) => return response::fault(e),
    };

    let cache = state.journal.read().await;
    let patterns = cache.get(&signature).map(|entry| &entry.patterns);
    let statements = journal::analyze::research(&stored, &candidates, patterns);
    drop(cache);

    match serde_json::to_vec(&statements) {
        Ok(out) => response::okay(out, false, started.elapsed()),
        Err(e) => response::fault(e),
    }
}

/// GET /v0/journal/{signature}/download
///
/// Streams the cached records as CSV in materialization order; an unknown
/// signature yields an empty body.
pub async fn download(State(state): State<AppState>, Path(signature): Path<String>) -> Response {
    let started = Instant::now();

    if !valid_signature(&signature) {
        return response::missing();
    }

    let cache = state.journal.read().await;
    let mut output = String::new();
    let mut cached = false;

    if let Some(entry) = cache.get(&signature) {
        cached = true;
        for record in &entry.records {
            output.push_str(&record.csv_row());
            output.push('\n');
        }
    }
    drop(cache);

    response::okay_stream(output.into_bytes(), cached, started.elapsed())
}
