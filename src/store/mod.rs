//! # Telemetry Store Module
//!
//! Durable, append-only storage of telemetry samples.
//!
//! This module handles:
//! - The [`TelemetryStore`] contract every backend implements
//! - SQLite persistence ([`SqliteStore`])
//! - An in-memory implementation for tests and throwaway runs ([`MemoryStore`])
//! - Choosing a backend from configuration

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use crate::telemetry::{SummaryAggregate, TelemetrySample, Vin};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage contract for telemetry samples.
///
/// Implementations own the samples they persist. Callers hold the store as
/// `Arc<dyn TelemetryStore>`; no implementation may rely on process-global
/// state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Persist a batch of samples atomically.
    ///
    /// Either every sample becomes visible or none does. Returns the number
    /// of samples written.
    async fn insert(&self, samples: Vec<TelemetrySample>) -> Result<usize>;

    /// Most recent sample for a vehicle.
    ///
    /// When several samples share the newest timestamp, the one inserted last
    /// is returned.
    async fn latest(&self, vin: &Vin) -> Result<Option<TelemetrySample>>;

    /// Aggregate the samples of a vehicle with `from <= timestamp <= to`.
    async fn query_window(
        &self,
        vin: &Vin,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SummaryAggregate>;

    /// Check that the store can serve requests.
    async fn ping(&self) -> Result<()>;
}

/// Open the backend selected in the configuration.
///
/// For SQLite the schema is created first (errors propagate), then the
/// best-effort time-series tuning is applied if enabled.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn TelemetryStore>> {
    match config.backend {
        StorageBackend::Sqlite => {
            let store = SqliteStore::open(
                &config.path,
                Duration::from_millis(config.busy_timeout_ms),
            )?;
            if config.time_series_tuning {
                store.provision_time_series();
            }
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("Using in-memory telemetry store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_memory_backend() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        };
        let store = open_store(&config).unwrap();
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_open_sqlite_backend_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("telemetry.db");
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            path: path.to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };

        let store = open_store(&config).unwrap();
        assert!(store.ping().await.is_ok());
        assert!(path.exists());
    }
}
