//! Storage configuration
//!
//! Every optional field falls back to its default when the storage is
//! built. A zero interval counts as unset.

use crate::snapshot::SnapshotFormat;
use std::time::Duration;

/// Default interval between janitor sweeps and between snapshots
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

/// Default snapshot name (files are `<name>.<ext>`)
pub const DEFAULT_SNAPSHOT_NAME: &str = "go-persista";

/// Top-level storage configuration
///
/// Both background tasks are disabled by default.
///
/// # Example
///
/// ```rust
/// use persista::{JanitorConfig, PersistenceConfig, SnapshotFormat, StorageConfig};
/// use std::time::Duration;
///
/// let config = StorageConfig::default()
///     .with_janitor(JanitorConfig::default())
///     .with_persistence(
///         PersistenceConfig::default()
///             .with_name("cache")
///             .with_format(SnapshotFormat::Json)
///             .with_interval(Duration::from_secs(30)),
///     );
/// assert!(config.janitor.is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Background sweep of expired entries (`None` = disabled)
    pub janitor: Option<JanitorConfig>,

    /// Periodic snapshots and startup load (`None` = disabled)
    pub persistence: Option<PersistenceConfig>,
}

impl StorageConfig {
    /// Creates a configuration with every background task disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the janitor
    pub fn with_janitor(mut self, janitor: JanitorConfig) -> Self {
        self.janitor = Some(janitor);
        self
    }

    /// Enables persistence
    pub fn with_persistence(mut self, persistence: PersistenceConfig) -> Self {
        self.persistence = Some(persistence);
        self
    }
}

/// Janitor configuration
#[derive(Debug, Clone, Default)]
pub struct JanitorConfig {
    /// Interval between sweeps (default: 15 seconds)
    pub interval: Option<Duration>,
}

impl JanitorConfig {
    /// Sets the sweep interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub(crate) fn resolve(&self) -> JanitorSettings {
        JanitorSettings {
            interval: interval_or_default(self.interval),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Default)]
pub struct PersistenceConfig {
    /// Snapshot name, without extension (default: "go-persista")
    pub name: Option<String>,

    /// Encoding used when saving (default: binary)
    ///
    /// Loading always tries binary first, then JSON.
    pub format: Option<SnapshotFormat>,

    /// Interval between snapshots (default: 15 seconds)
    pub interval: Option<Duration>,
}

impl PersistenceConfig {
    /// Sets the snapshot name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the encoding used when saving
    pub fn with_format(mut self, format: SnapshotFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Sets the snapshot interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub(crate) fn resolve(&self) -> PersistenceSettings {
        PersistenceSettings {
            name: match &self.name {
                Some(name) if !name.is_empty() => name.clone(),
                _ => DEFAULT_SNAPSHOT_NAME.to_string(),
            },
            format: self.format.unwrap_or_default(),
            interval: interval_or_default(self.interval),
        }
    }
}

/// Janitor configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JanitorSettings {
    pub interval: Duration,
}

/// Persistence configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PersistenceSettings {
    pub name: String,
    pub format: SnapshotFormat,
    pub interval: Duration,
}

fn interval_or_default(interval: Option<Duration>) -> Duration {
    match interval {
        Some(interval) if !interval.is_zero() => interval,
        _ => DEFAULT_INTERVAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert!(config.janitor.is_none());
        assert!(config.persistence.is_none());
    }

    #[test]
    fn test_defaults_are_filled() {
        assert_eq!(JanitorConfig::default().resolve().interval, DEFAULT_INTERVAL);

        let settings = PersistenceConfig::default().resolve();
        assert_eq!(
            settings,
            PersistenceSettings {
                name: "go-persista".to_string(),
                format: SnapshotFormat::Binary,
                interval: Duration::from_secs(15),
            }
        );
    }

    #[test]
    fn test_zero_and_empty_values_mean_default() {
        let janitor = JanitorConfig::default().with_interval(Duration::ZERO);
        assert_eq!(janitor.resolve().interval, DEFAULT_INTERVAL);

        let settings = PersistenceConfig::default()
            .with_name("")
            .with_interval(Duration::ZERO)
            .resolve();
        assert_eq!(settings.name, DEFAULT_SNAPSHOT_NAME);
        assert_eq!(settings.interval, DEFAULT_INTERVAL);
    }

    #[test]
    fn test_explicit_values_are_kept() {
        let settings = PersistenceConfig::default()
            .with_name("cache")
            .with_format(SnapshotFormat::Json)
            .with_interval(Duration::from_millis(250))
            .resolve();

        assert_eq!(settings.name, "cache");
        assert_eq!(settings.format, SnapshotFormat::Json);
        assert_eq!(settings.interval, Duration::from_millis(250));
    }
}
