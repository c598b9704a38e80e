//! HTTP handlers for the object endpoint

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::debug;

use super::metrics;
use crate::storage::Storage;

/// Header carrying the absolute expiration of a stored object (RFC 3339)
pub const EXPIRES_HEADER: &str = "Expires";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    pub metrics: PrometheusHandle,
}

/// Store the request body under `key`
pub async fn put_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    metrics::record_put();

    let expires_at = match parse_expires(&headers) {
        Ok(expires_at) => expires_at,
        Err(()) => return (StatusCode::BAD_REQUEST, "Invalid expires header").into_response(),
    };

    debug!("PUT {} ({} bytes, expires {:?})", key, body.len(), expires_at);
    state.storage.put(key, body, expires_at);

    StatusCode::OK.into_response()
}

/// Return the bytes stored under `key`
pub async fn get_object(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    metrics::record_get();

    match state.storage.get(&key) {
        Some(data) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            data,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Object not found").into_response(),
    }
}

/// Liveness probe
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// Prometheus text exposition
pub async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}

/// Unmatched routes; `/objects/` alone lacks a key
pub async fn fallback(uri: Uri) -> Response {
    if uri.path() == "/objects/" {
        (StatusCode::BAD_REQUEST, "Key is required").into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

/// An absent or empty header means no expiration
fn parse_expires(headers: &HeaderMap) -> Result<Option<DateTime<Utc>>, ()> {
    let value = match headers.get(EXPIRES_HEADER) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    let value = value.to_str().map_err(|_| ())?;
    let expires_at = DateTime::parse_from_rfc3339(value.trim()).map_err(|_| ())?;

    Ok(Some(expires_at.with_timezone(&Utc)))
}
