use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{MonitorError, Result};
use crate::metrics::{compute_alerts, compute_power_kw, Alert};
use crate::store::TelemetryStore;
use crate::telemetry::{SummaryAggregate, TelemetrySample, Vin};

/// Latest sample of a vehicle with its derived metrics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestReading {
    pub vin: String,
    pub ts: DateTime<Utc>,
    pub soc: Option<f64>,
    pub soh: Option<f64>,
    pub pack_voltage: Option<f64>,
    pub pack_current: Option<f64>,
    pub power_kw: Option<f64>,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
    pub odo_km: Option<f64>,
    pub alerts: Vec<Alert>,
}

impl From<&TelemetrySample> for LatestReading {
    fn from(sample: &TelemetrySample) -> Self {
        Self {
            vin: sample.vin().to_string(),
            ts: sample.timestamp(),
            soc: sample.soc(),
            soh: sample.soh(),
            pack_voltage: sample.pack_voltage(),
            pack_current: sample.pack_current(),
            power_kw: compute_power_kw(sample.pack_voltage(), sample.pack_current()),
            max_temp: sample.max_temp(),
            min_temp: sample.min_temp(),
            odo_km: sample.odometer_km(),
            alerts: compute_alerts(sample),
        }
    }
}

/// Aggregate over one vehicle's time window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub vin: String,
    pub from_ts: DateTime<Utc>,
    pub to_ts: DateTime<Utc>,
    #[serde(flatten)]
    pub aggregate: SummaryAggregate,
}

/// Store reachability as reported by the health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub store_reachable: bool,
}

/// Read side: latest readings, summaries and health.
///
/// Alerts are only evaluated on the latest sample; summaries carry raw
/// aggregates without derived metrics.
pub struct QueryService {
    store: Arc<dyn TelemetryStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self { store }
    }

    /// Latest reading for a vehicle, annotated with power and alerts.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the vehicle has no telemetry (including identifiers
    ///   that could never have been ingested)
    /// - `StoreUnavailable` if the store fails
    pub async fn get_latest(&self, vin: &str) -> Result<LatestReading> {
        let not_found = || MonitorError::NotFound(vin.to_string());
        let parsed = Vin::parse(vin).map_err(|_| not_found())?;

        debug!(vin = %parsed, "Fetching latest telemetry");

        let sample = self.store.latest(&parsed).await?.ok_or_else(not_found)?;
        Ok(LatestReading::from(&sample))
    }

    /// Aggregate a vehicle's samples with `from_ts <= ts <= to_ts`.
    ///
    /// # Errors
    ///
    /// - `InvalidRange` if `to_ts <= from_ts`, checked before the store is used
    /// - `StoreUnavailable` if the store fails
    pub async fn get_summary(
        &self,
        vin: &str,
        from_ts: DateTime<Utc>,
        to_ts: DateTime<Utc>,
    ) -> Result<SummaryReport> {
        if to_ts <= from_ts {
            return Err(MonitorError::InvalidRange { from: from_ts, to: to_ts });
        }

        debug!(vin = %vin, from = %from_ts, to = %to_ts, "Summarizing telemetry window");

        // An identifier that fails validation cannot have stored samples
        let aggregate = match Vin::parse(vin) {
            Ok(parsed) => self.store.query_window(&parsed, from_ts, to_ts).await?,
            Err(_) => SummaryAggregate::default(),
        };
        if aggregate.is_empty() {
            debug!(vin = %vin, "No telemetry in window");
        }

        Ok(SummaryReport {
            vin: vin.to_string(),
            from_ts,
            to_ts,
            aggregate,
        })
    }

    /// Report whether the store answers.
    pub async fn health(&self) -> HealthStatus {
        match self.store.ping().await {
            Ok(()) => HealthStatus {
                status: "OK".to_string(),
                store_reachable: true,
            },
            Err(e) => {
                warn!("Telemetry store health check failed: {}", e);
                HealthStatus {
                    status: "DEGRADED".to_string(),
                    store_reachable: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{AlertCode, Severity};
    use crate::store::{MemoryStore, MockTelemetryStore};
    use crate::telemetry::TelemetryRecord;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    async fn seeded_store(records: Vec<TelemetryRecord>) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let samples = records
            .into_iter()
            .map(|r| TelemetrySample::try_from(r).unwrap())
            .collect();
        store.insert(samples).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_get_latest_composes_metrics() {
        let store = seeded_store(vec![TelemetryRecord {
            soc: Some(15.0),
            soh: Some(92.0),
            pack_voltage: Some(400.0),
            pack_current: Some(-100.0),
            max_temp: Some(61.0),
            min_temp: Some(40.0),
            odo_km: Some(1000.0),
            ..TelemetryRecord::new("VIN-AAAAA", t0())
        }])
        .await;
        let service = QueryService::new(store);

        let reading = service.get_latest("VIN-AAAAA").await.unwrap();

        assert_eq!(reading.vin, "VIN-AAAAA");
        assert_eq!(reading.ts, t0());
        assert_eq!(reading.power_kw, Some(-40.0));
        assert_eq!(reading.odo_km, Some(1000.0));
        let codes: Vec<_> = reading.alerts.iter().map(|a| (a.code, a.severity)).collect();
        assert_eq!(
            codes,
            vec![(AlertCode::HighTemp, Severity::Red), (AlertCode::SocWarning, Severity::Yellow)]
        );
    }

    #[tokio::test]
    async fn test_get_latest_returns_newest_sample() {
        let store = seeded_store(vec![
            TelemetryRecord { soc: Some(70.0), ..TelemetryRecord::new("VIN-AAAAA", t0()) },
            TelemetryRecord {
                soc: Some(65.0),
                ..TelemetryRecord::new("VIN-AAAAA", t0() + Duration::minutes(5))
            },
        ])
        .await;
        let service = QueryService::new(store);

        let reading = service.get_latest("VIN-AAAAA").await.unwrap();
        assert_eq!(reading.ts, t0() + Duration::minutes(5));
        assert_eq!(reading.soc, Some(65.0));
        assert_eq!(reading.power_kw, None);
        assert!(reading.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_get_latest_not_found() {
        let mut mock_store = MockTelemetryStore::new();
        mock_store
            .expect_latest()
            .withf(|vin: &Vin| vin.as_str() == "VIN-ZZZZZ")
            .times(1)
            .returning(|_| Ok(None));

        let service = QueryService::new(Arc::new(mock_store));

        let result = service.get_latest("VIN-ZZZZZ").await;
        assert!(matches!(result, Err(MonitorError::NotFound(ref v)) if v == "VIN-ZZZZZ"));
    }

    #[tokio::test]
    async fn test_get_latest_malformed_vin_is_not_found() {
        let mut mock_store = MockTelemetryStore::new();
        mock_store.expect_latest().times(0);
        let service = QueryService::new(Arc::new(mock_store));

        let result = service.get_latest("abc").await;
        assert!(matches!(result, Err(MonitorError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_latest_store_failure_propagates() {
        let mut mock_store = MockTelemetryStore::new();
        mock_store
            .expect_latest()
            .returning(|_| Err(MonitorError::StoreUnavailable("database is locked".to_string())));

        let service = QueryService::new(Arc::new(mock_store));

        let result = service.get_latest("VIN-AAAAA").await;
        assert!(matches!(result, Err(MonitorError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_get_summary_rejects_inverted_and_empty_ranges() {
        let mut mock_store = MockTelemetryStore::new();
        mock_store.expect_query_window().times(0);
        let service = QueryService::new(Arc::new(mock_store));

        for vin in ["VIN-AAAAA", "x"] {
            let equal = service.get_summary(vin, t0(), t0()).await;
            assert!(matches!(equal, Err(MonitorError::InvalidRange { .. })));

            let inverted = service.get_summary(vin, t0(), t0() - Duration::seconds(1)).await;
            assert!(matches!(inverted, Err(MonitorError::InvalidRange { .. })));
        }
    }

    #[tokio::test]
    async fn test_get_summary_aggregates_window() {
        let store = seeded_store(vec![
            TelemetryRecord {
                soc: Some(80.0),
                max_temp: Some(35.0),
                min_temp: Some(30.0),
                ..TelemetryRecord::new("VIN-AAAAA", t0())
            },
            TelemetryRecord {
                soc: Some(5.0),
                max_temp: Some(65.0),
                min_temp: Some(28.0),
                ..TelemetryRecord::new("VIN-AAAAA", t0() + Duration::minutes(30))
            },
        ])
        .await;
        let service = QueryService::new(store);

        let report = service
            .get_summary("VIN-AAAAA", t0(), t0() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(report.vin, "VIN-AAAAA");
        assert_eq!(report.aggregate.sample_count, 2);
        assert_eq!(report.aggregate.soc_min, Some(5.0));
        assert_eq!(report.aggregate.soc_max, Some(80.0));
        assert_eq!(report.aggregate.temp_max, Some(65.0));
        assert_eq!(report.aggregate.temp_min, Some(28.0));
    }

    #[tokio::test]
    async fn test_get_summary_empty_window_is_not_an_error() {
        let service = QueryService::new(Arc::new(MemoryStore::new()));

        let report = service
            .get_summary("VIN-AAAAA", t0(), t0() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(report.aggregate, SummaryAggregate::default());
    }

    #[tokio::test]
    async fn test_get_summary_store_failure_propagates() {
        let mut mock_store = MockTelemetryStore::new();
        mock_store
            .expect_query_window()
            .times(1)
            .returning(|_, _, _| Err(MonitorError::StoreUnavailable("gone".to_string())));

        let service = QueryService::new(Arc::new(mock_store));

        let result = service
            .get_summary("VIN-AAAAA", t0(), t0() + Duration::hours(1))
            .await;
        assert!(matches!(result, Err(MonitorError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_health_reports_store_state() {
        let service = QueryService::new(Arc::new(MemoryStore::new()));
        let health = service.health().await;
        assert!(health.store_reachable);
        assert_eq!(health.status, "OK");

        let mut mock_store = MockTelemetryStore::new();
        mock_store
            .expect_ping()
            .returning(|| Err(MonitorError::StoreUnavailable("unreachable".to_string())));
        let service = QueryService::new(Arc::new(mock_store));
        assert!(!service.health().await.store_reachable);
    }

    #[test]
    fn test_summary_report_json_shape() {
        let report = SummaryReport {
            vin: "VIN-AAAAA".to_string(),
            from_ts: t0(),
            to_ts: t0() + Duration::hours(1),
            aggregate: SummaryAggregate::default(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["samples"], 0);
        assert!(json["soc_min"].is_null());
        assert!(json["temp_max"].is_null());
        assert_eq!(json["from_ts"], "2024-05-01T12:00:00Z");
    }
}
