//! Web interface module
//!
//! Exposes the storage over HTTP: `PUT`/`GET` on `/objects/{key}`,
//! liveness and readiness probes, and Prometheus metrics. Nothing here goes
//! beyond dispatching to [`Storage`](crate::Storage).

mod handlers;
pub mod metrics;
mod server;

pub use handlers::{AppState, EXPIRES_HEADER};
pub use server::{router, run_web_server};
