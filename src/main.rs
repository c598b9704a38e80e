use anyhow::Context;
use clap::Parser;
use persista::web::{self, AppState};
use persista::{JanitorConfig, PersistenceConfig, SnapshotFormat, Storage, StorageConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Persista - in-memory key/value storage with periodic snapshots
#[derive(Debug, Parser)]
#[command(name = "persista")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Address the HTTP server listens on
    #[arg(long, env = "PERSISTA_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,

    /// Snapshot name, files are `<name>.bin` / `<name>.json`
    #[arg(long, env = "PERSISTA_SNAPSHOT_NAME", default_value = persista::config::DEFAULT_SNAPSHOT_NAME)]
    snapshot_name: String,

    /// Encoding used when saving snapshots (bin or json)
    #[arg(long, env = "PERSISTA_SNAPSHOT_FORMAT", default_value = "json")]
    snapshot_format: SnapshotFormat,

    /// Seconds between snapshots
    #[arg(long, env = "PERSISTA_SAVE_INTERVAL_SECS", default_value_t = 15)]
    save_interval_secs: u64,

    /// Disable snapshots entirely
    #[arg(long, env = "PERSISTA_NO_PERSISTENCE")]
    no_persistence: bool,

    /// Seconds between janitor sweeps (janitor disabled when absent)
    #[arg(long, env = "PERSISTA_JANITOR_INTERVAL_SECS")]
    janitor_interval_secs: Option<u64>,
}

impl Cli {
    fn storage_config(&self) -> StorageConfig {
        let mut config = StorageConfig::new();

        if !self.no_persistence {
            config = config.with_persistence(
                PersistenceConfig::default()
                    .with_name(self.snapshot_name.clone())
                    .with_format(self.snapshot_format)
                    .with_interval(Duration::from_secs(self.save_interval_secs)),
            );
        }

        if let Some(secs) = self.janitor_interval_secs {
            config = config.with_janitor(JanitorConfig::default().with_interval(Duration::from_secs(secs)));
        }

        config
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Persista starting...");

    let cancel = CancellationToken::new();
    let storage = Arc::new(Storage::new(cancel.clone(), cli.storage_config()));

    let served = serve(&cli.addr, storage.clone(), cancel.clone()).await;
    // The saver is already running, flush it whatever stopped the server
    cancel.cancel();
    info!("Server stopped");

    storage.shutdown().await;
    info!("Storage stopped ({} entries in memory)", storage.stats().total_keys);

    served
}

/// Serve HTTP on `addr` until `cancel` fires
async fn serve(addr: &str, storage: Arc<Storage>, cancel: CancellationToken) -> anyhow::Result<()> {
    let state = AppState {
        storage,
        metrics: web::metrics::init_metrics()?,
    };

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tokio::spawn(wait_for_signal(cancel.clone()));

    web::run_web_server(listener, state, cancel.cancelled_owned())
        .await
        .context("HTTP server error")
}

/// Cancel `cancel` on SIGINT or SIGTERM
async fn wait_for_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }

    cancel.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_startup_failure_still_flushes_storage() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap().to_string();
        let dir = TempDir::new().unwrap();
        let name = dir.path().join("flushed").to_string_lossy().into_owned();

        let cli = Cli::parse_from(["persista", "--addr", &addr, "--snapshot-name", &name]);
        assert!(run(cli).await.is_err());

        assert!(dir.path().join("flushed.json").exists());
    }
}
