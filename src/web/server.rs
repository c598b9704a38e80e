//! HTTP server implementation

use axum::{middleware, routing::get, Router};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers::{
    fallback, get_object, liveness, put_object, readiness, render_metrics, AppState,
};
use super::metrics::track_duration;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let objects = Router::new()
        .route("/objects/*key", get(get_object).put(put_object))
        .route_layer(middleware::from_fn(track_duration));

    Router::new()
        .merge(objects)
        .route("/probes/liveness", get(liveness))
        .route("/probes/readiness", get(readiness))
        .route("/metrics", get(render_metrics))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the web server until `shutdown` resolves, then drain open requests
pub async fn run_web_server(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
