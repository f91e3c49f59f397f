//! In-memory telemetry store.
//!
//! Same contract as the SQLite store, with rows kept in a `Vec` owned by the
//! store instance. Each instance is independent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::TelemetryStore;
use crate::error::Result;
use crate::telemetry::{SummaryAggregate, TelemetrySample, Vin};

/// Telemetry store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    samples: RwLock<Vec<TelemetrySample>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Number of stored samples across all vehicles
    pub(crate) fn len(&self) -> usize {
        self.samples.read().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.samples.read().is_empty()
    }
}

#[async_trait]
impl TelemetryStore for MemoryStore {
    async fn insert(&self, samples: Vec<TelemetrySample>) -> Result<usize> {
        let count = samples.len();
        self.samples.write().extend(samples);
        Ok(count)
    }

    async fn latest(&self, vin: &Vin) -> Result<Option<TelemetrySample>> {
        // max_by_key keeps the last of equal maxima, i.e. the latest insert
        let latest = self
            .samples
            .read()
            .iter()
            .filter(|s| s.vin() == vin)
            .max_by_key(|s| s.timestamp())
            .cloned();
        Ok(latest)
    }

    async fn query_window(
        &self,
        vin: &Vin,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SummaryAggregate> {
        let aggregate = self
            .samples
            .read()
            .iter()
            .filter(|s| s.vin() == vin && s.timestamp() >= from && s.timestamp() <= to)
            .collect();
        Ok(aggregate)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
