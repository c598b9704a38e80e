//! Janitor
//!
//! Periodically removes expired entries so that keys nobody reads again do
//! not stay in memory forever.

use crate::store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Sweep `store` every `interval` until `cancel` fires
///
/// There is no final sweep on shutdown: expired entries left behind are
/// saved as they are and cleaned up after the next start.
pub(crate) async fn run(store: Arc<MemoryStore>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => return,

            _ = ticker.tick() => {
                let removed = store.sweep_expired();
                if removed > 0 {
                    debug!("Janitor removed {} expired entries", removed);
                }
            }
        }
    }
}
