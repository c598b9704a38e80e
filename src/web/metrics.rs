//! Prometheus metrics for the HTTP endpoint
//!
//! - `persista_put_objects_total` - objects put in the storage
//! - `persista_get_objects_total` - objects requested from the storage
//! - `persista_request_duration_seconds` - object request latency (labels: method, path)

use anyhow::Context;
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

pub const PUT_OBJECTS_TOTAL: &str = "persista_put_objects_total";
pub const GET_OBJECTS_TOTAL: &str = "persista_get_objects_total";
pub const REQUEST_DURATION_SECONDS: &str = "persista_request_duration_seconds";

/// Prometheus client default buckets
const DURATION_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder.
///
/// Calling it again returns the handle installed the first time.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &DURATION_BUCKETS,
        )
        .context("invalid histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    describe_counter!(PUT_OBJECTS_TOTAL, "The total number of objects put in the storage");
    describe_counter!(GET_OBJECTS_TOTAL, "The total number of objects get from the storage");
    describe_histogram!(REQUEST_DURATION_SECONDS, "The duration of HTTP requests");

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Records a PUT on an object.
pub fn record_put() {
    counter!(PUT_OBJECTS_TOTAL).increment(1);
}

/// Records a GET on an object.
pub fn record_get() {
    counter!(GET_OBJECTS_TOTAL).increment(1);
}

/// Middleware measuring the duration of each request, labelled by route
pub async fn track_duration(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let response = next.run(request).await;

    histogram!(REQUEST_DURATION_SECONDS, "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    response
}
