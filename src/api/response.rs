//! Reply helpers for 2xx, 4xx and 5xx
//!
//! Every success response carries `X-Cache` (served from a process cache or
//! not), `X-Benchmark` (handler wall time) and `X-Server`; errors answer in
//! plain text so the body is the message.

use std::fmt::Display;
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

/// Identification string carried in `X-Server`
pub fn server_signature() -> String {
    format!(
        "fiscus v{}; {}-{}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

fn service_headers(cached: bool, lap: Duration) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        HeaderName::from_static("x-cache"),
        HeaderValue::from_static(if cached { "true" } else { "false" }),
    );
    // Duration's debug format is not header-safe (µs), so millis it is
    let benchmark = format!("{:.3}ms", lap.as_secs_f64() * 1000.0);
    if let Ok(value) = HeaderValue::from_str(&benchmark) {
        headers.insert(HeaderName::from_static("x-benchmark"), value);
    }
    if let Ok(value) = HeaderValue::from_str(&server_signature()) {
        headers.insert(HeaderName::from_static("x-server"), value);
    }

    headers
}

/// 200 with a JSON body
pub fn okay(output: Vec<u8>, cached: bool, lap: Duration) -> Response {
    let mut headers = service_headers(cached, lap);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );

    (StatusCode::OK, headers, output).into_response()
}

/// 200 with a CSV body
pub fn okay_stream(output: Vec<u8>, cached: bool, lap: Duration) -> Response {
    let mut headers = service_headers(cached, lap);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );

    (StatusCode::OK, headers, output).into_response()
}

/// 400 for malformed payloads; the body is the decoder's message
pub fn wrong(err: impl Display) -> Response {
    let message = err.to_string();
    warn!("bad request: {message}");

    (StatusCode::BAD_REQUEST, x_server(), message).into_response()
}

/// 500 for store and serialization failures
pub fn fault(err: impl Display) -> Response {
    let message = err.to_string();
    error!("request failed: {message}");

    (StatusCode::INTERNAL_SERVER_ERROR, x_server(), message).into_response()
}

/// 404 for paths outside the route contract
pub fn missing() -> Response {
    (StatusCode::NOT_FOUND, x_server(), "not found".to_string()).into_response()
}

fn x_server() -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&server_signature()) {
        headers.insert(HeaderName::from_static("x-server"), value);
    }
    headers
}
