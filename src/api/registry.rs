//! Registry HTTP surface
//!
//! JSON read/write of the three entity kinds with a per-URL response cache.
//! The cache contract: a GET miss populates its own URL; an actor or label
//! POST evicts only its own URL; a transaction POST swaps in an empty map,
//! because a transaction batch may create actors and labels as a side
//! effect. Decode failures never touch the cache.

use std::collections::HashMap;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use chrono::{Days, Local, Months, TimeZone, Utc};

use crate::api::response;
use crate::db;
use crate::AppState;

const ACTORS_PATH: &str = "/v0/registry/actors";
const LABELS_PATH: &str = "/v0/registry/labels";
const TRANSACTIONS_PATH: &str = "/v0/registry/transactions";

/// GET /v0/registry/actors
pub async fn read_actors(State(state): State<AppState>) -> Response {
    let started = Instant::now();

    if let Some(cached) = state.routes.read().await.get(ACTORS_PATH).cloned() {
        return response::okay(cached, true, started.elapsed());
    }

    let actors = match db::actors::pull(&state.db, state.batch).await {
        Ok(actors) => actors,
        Err(e) => return response::fault(e),
    };
    let out = match serde_json::to_vec(&actors) {
        Ok(out) => out,
        Err(e) => return response::fault(e),
    };

    state
        .routes
        .write()
        .await
        .insert(ACTORS_PATH.to_string(), out.clone());

    response::okay(out, false, started.elapsed())
}

/// POST /v0/registry/actors
pub async fn write_actors(State(state): State<AppState>, payload: Bytes) -> Response {
    let started = Instant::now();

    let actors: Vec<db::Actor> = match serde_json::from_slice(&payload) {
        Ok(actors) => actors,
        Err(e) => return response::wrong(e),
    };

    if let Err(e) = db::actors::push(&state.db, &actors, state.batch as usize).await {
        return response::fault(e);
    }

    state.routes.write().await.remove(ACTORS_PATH);

    match serde_json::to_vec(&actors) {
        Ok(out) => response::okay(out, false, started.elapsed()),
        Err(e) => response::fault(e),
    }
}

/// GET /v0/registry/labels
pub async fn read_labels(State(state): State<AppState>) -> Response {
    let started = Instant::now();

    if let Some(cached) = state.routes.read().await.get(LABELS_PATH).cloned() {
        return response::okay(cached, true, started.elapsed());
    }

    let labels = match db::labels::pull(&state.db, state.batch).await {
        Ok(labels) => labels,
        Err(e) => return response::fault(e),
    };
    let out = match serde_json::to_vec(&labels) {
        Ok(out) => out,
        Err(e) => return response::fault(e),
    };

    state
        .routes
        .write()
        .await
        .insert(LABELS_PATH.to_string(), out.clone());

    response::okay(out, false, started.elapsed())
}

/// POST /v0/registry/labels
pub async fn write_labels(State(state): State<AppState>, payload: Bytes) -> Response {
    let started = Instant::now();

    let labels: Vec<db::Label> = match serde_json::from_slice(&payload) {
        Ok(labels) => labels,
        Err(e) => return response::wrong(e),
    };

    if let Err(e) = db::labels::push(&state.db, &labels, state.batch as usize).await {
        return response::fault(e);
    }

    state.routes.write().await.remove(LABELS_PATH);

    match serde_json::to_vec(&labels) {
        Ok(out) => response::okay(out, false, started.elapsed()),
        Err(e) => response::fault(e),
    }
}

/// GET /v0/registry/transactions
pub async fn read_transactions(State(state): State<AppState>) -> Response {
    let started = Instant::now();

    if let Some(cached) = state.routes.read().await.get(TRANSACTIONS_PATH).cloned() {
        return response::okay(cached, true, started.elapsed());
    }

    let transactions = match db::transactions::pull(&state.db, state.batch).await {
        Ok(transactions) => transactions,
        Err(e) => return response::fault(e),
    };
    let out = match serde_json::to_vec(&transactions) {
        Ok(out) => out,
        Err(e) => return response::fault(e),
    };

    state
        .routes
        .write()
        .await
        .insert(TRANSACTIONS_PATH.to_string(), out.clone());

    response::okay(out, false, started.elapsed())
}

/// POST /v0/registry/transactions
///
/// A transaction batch can create actors and labels as well, so the whole
/// route cache is recreated rather than evicting single URLs.
pub async fn write_transactions(State(state): State<AppState>, payload: Bytes) -> Response {
    let started = Instant::now();

    let mut transactions: Vec<db::Transaction> = match serde_json::from_slice(&payload) {
        Ok(transactions) => transactions,
        Err(e) => return response::wrong(e),
    };

    let pushed = db::transactions::push(&state.db, &mut transactions, state.batch as usize).await;
    *state.routes.write().await = HashMap::new();

    if let Err(e) = pushed {
        return response::fault(e);
    }

    let out = match serde_json::to_vec(&transactions) {
        Ok(out) => out,
        Err(e) => return response::fault(e),
    };

    response::okay(out, false, started.elapsed())
}

/// GET /v0/registry/transactions/{YYYY}/{MM}
///
/// Monthly window in the local time zone, cached per URL. Non-numeric
/// parameters fall outside the route contract.
pub async fn read_monthly_transactions(
    State(state): State<AppState>,
    Path((year, month)): Path<(String, String)>,
) -> Response {
    let started = Instant::now();
    let key = format!("{TRANSACTIONS_PATH}/{year}/{month}");

    let (Ok(year), Ok(month)) = (year.parse::<i32>(), month.parse::<u32>()) else {
        return response::missing();
    };

    if let Some(cached) = state.routes.read().await.get(&key).cloned() {
        return response::okay(cached, true, started.elapsed());
    }

    let Some(from) = Local.with_ymd_and_hms(year, month, 1, 0, 0, 0).single() else {
        return response::missing();
    };
    let Some(to) = from
        .checked_add_months(Months::new(1))
        .and_then(|t| t.checked_sub_days(Days::new(1)))
    else {
        return response::missing();
    };

    let transactions = match db::transactions::pull_between(
        &state.db,
        from.with_timezone(&Utc),
        to.with_timezone(&Utc),
        state.batch,
    )
    .await
    {
        Ok(transactions) => transactions,
        Err(e) => return response::fault(e),
    };
    let out = match serde_json::to_vec(&transactions) {
        Ok(out) => out,
        Err(e) => return response::fault(e),
    };

    state.routes.write().await.insert(key, out.clone());

    response::okay(out, false, started.elapsed())
}
