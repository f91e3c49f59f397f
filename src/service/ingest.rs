use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{MonitorError, Result};
use crate::store::TelemetryStore;
use crate::telemetry::{TelemetryRecord, TelemetrySample};

/// Validates inbound batches and hands them to the store.
///
/// A batch is accepted whole or not at all: one invalid item rejects the
/// call before anything is written.
pub struct IngestService {
    store: Arc<dyn TelemetryStore>,
}

impl IngestService {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a batch of records.
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Number of samples inserted
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the batch is empty or any item is invalid
    /// - `StoreUnavailable` if the store rejects the write
    pub async fn ingest(&self, batch: Vec<TelemetryRecord>) -> Result<usize> {
        if batch.is_empty() {
            warn!("Rejected empty telemetry batch");
            return Err(MonitorError::InvalidInput("batch cannot be empty".to_string()));
        }

        let validated = batch
            .into_iter()
            .enumerate()
            .map(|(i, record)| {
                TelemetrySample::try_from(record).map_err(|e| match e {
                    MonitorError::InvalidInput(msg) => {
                        MonitorError::InvalidInput(format!("item {}: {}", i, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>();
        let samples = match validated {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Rejected telemetry batch: {}", e);
                return Err(e);
            }
        };

        let vins: BTreeSet<String> = samples.iter().map(|s| s.vin().to_string()).collect();

        let inserted = self.store.insert(samples).await?;

        info!(count = inserted, vins = ?vins, "Telemetry batch ingested");
        Ok(inserted)
    }
}
