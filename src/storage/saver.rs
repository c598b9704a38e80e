//! Saver
//!
//! Periodically writes a snapshot of the store, plus one final snapshot when
//! the storage is cancelled. Failed saves are logged and the tick is skipped;
//! the next tick is the only retry.

use crate::config::PersistenceSettings;
use crate::snapshot;
use crate::store::MemoryStore;
use std::sync::Arc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Save `store` every `settings.interval` until `cancel` fires, then once more
pub(crate) async fn run(
    store: Arc<MemoryStore>,
    settings: PersistenceSettings,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                info!("Saving storage to {} before shutdown", settings.name);
                match save(&store, &settings).await {
                    Ok(count) => info!("Saved {} entries to {} on shutdown", count, settings.name),
                    Err(e) => error!("Save on shutdown failed: {:#}", e),
                }
                return;
            }

            _ = ticker.tick() => {
                match save(&store, &settings).await {
                    Ok(count) => debug!("Saved {} entries to {}", count, settings.name),
                    Err(e) => warn!("Save failed, skipping until next tick: {:#}", e),
                }
            }
        }
    }
}

/// Run a save on the blocking pool
async fn save(store: &Arc<MemoryStore>, settings: &PersistenceSettings) -> anyhow::Result<usize> {
    let store = store.clone();
    let name = settings.name.clone();
    let format = settings.format;

    let count = tokio::task::spawn_blocking(move || snapshot::save(&store, &name, format)).await??;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotFormat;
    use std::time::Duration;
    use tempfile::TempDir;

    fn settings(dir: &TempDir, interval: Duration) -> PersistenceSettings {
        PersistenceSettings {
            name: dir.path().join("saver").to_string_lossy().into_owned(),
            format: SnapshotFormat::Binary,
            interval,
        }
    }

    #[tokio::test]
    async fn test_saver_saves_on_tick() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.put("k", "v", None);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(
            store.clone(),
            settings(&dir, Duration::from_millis(30)),
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(dir.path().join("saver.bin").exists());

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_saver_flushes_once_on_cancel() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        store.put("k", "v", None);

        let cancel = CancellationToken::new();
        cancel.cancel();
        run(store.clone(), settings(&dir, Duration::from_secs(3600)), cancel).await;

        let restored = MemoryStore::new();
        tokio_test::assert_ok!(snapshot::load(&restored, &dir.path().join("saver").to_string_lossy()));
        assert_eq!(restored.get("k"), Some(bytes::Bytes::from("v")));
    }

    #[tokio::test]
    async fn test_saver_survives_failed_saves() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut settings = settings(&dir, Duration::from_millis(10));
        settings.name = dir.path().join("missing/saver").to_string_lossy().into_owned();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(store, settings, cancel.clone()));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!task.is_finished());

        cancel.cancel();
        task.await.unwrap();
    }
}
