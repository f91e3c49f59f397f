//! # SQLite Telemetry Store
//!
//! Persists one row per sample in a single `telemetry` table, indexed by
//! `(vin, ts_us DESC)` for latest lookups and range scans.
//!
//! Timestamps are stored as microseconds since the Unix epoch (`ts_us`).
//! Every statement runs on the blocking thread pool; the connection is shared
//! behind a mutex.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::TelemetryStore;
use crate::error::{MonitorError, Result};
use crate::telemetry::{SummaryAggregate, TelemetryRecord, TelemetrySample, Vin};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS telemetry (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vin TEXT NOT NULL,
    ts_us INTEGER NOT NULL,
    soc REAL,
    soh REAL,
    pack_voltage REAL,
    pack_current REAL,
    max_temp REAL,
    min_temp REAL,
    odo_km REAL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS ix_telemetry_vin_ts ON telemetry (vin, ts_us DESC);
"#;

const SELECT_COLUMNS: &str =
    "vin, ts_us, soc, soh, pack_voltage, pack_current, max_temp, min_temp, odo_km";

/// Telemetry store backed by a SQLite database file
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::StoreUnavailable` if the file cannot be opened
    /// or the schema cannot be created.
    pub fn open<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                MonitorError::StoreUnavailable(format!(
                    "cannot create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened telemetry database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private database that lives only as long as this store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    /// Tune the database for append-heavy time-series load.
    ///
    /// Best-effort: a failure is logged and otherwise ignored, and queries
    /// return the same results either way.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the tuning was applied
    pub fn provision_time_series(&self) -> bool {
        let conn = self.conn.lock();
        match conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;") {
            Ok(()) => {
                debug!("Time-series tuning applied (WAL, synchronous=NORMAL)");
                true
            }
            Err(e) => {
                warn!("Time-series tuning unavailable, continuing without it: {}", e);
                false
            }
        }
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await?
    }
}

#[async_trait]
impl TelemetryStore for SqliteStore {
    async fn insert(&self, samples: Vec<TelemetrySample>) -> Result<usize> {
        self.run(move |conn| {
            let created_at = Utc::now().to_rfc3339();
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(
                    "INSERT INTO telemetry (vin, ts_us, soc, soh, pack_voltage, pack_current, \
                     max_temp, min_temp, odo_km, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                )?;
                for s in &samples {
                    stmt.execute(params![
                        s.vin().as_str(),
                        micros_floor(s.timestamp()),
                        s.soc(),
                        s.soh(),
                        s.pack_voltage(),
                        s.pack_current(),
                        s.max_temp(),
                        s.min_temp(),
                        s.odometer_km(),
                        created_at,
                    ])?;
                }
            }
            // Dropping an uncommitted transaction rolls it back
            tx.commit()?;
            Ok(samples.len())
        })
        .await
    }

    async fn latest(&self, vin: &Vin) -> Result<Option<TelemetrySample>> {
        let vin = vin.clone();
        self.run(move |conn| {
            let sql = format!(
                "SELECT {} FROM telemetry WHERE vin = ?1 ORDER BY ts_us DESC, id DESC LIMIT 1",
                SELECT_COLUMNS
            );
            let row = conn
                .query_row(&sql, params![vin.as_str()], read_row)
                .optional()?;
            row.map(restore_sample).transpose()
        })
        .await
    }

    async fn query_window(
        &self,
        vin: &Vin,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SummaryAggregate> {
        let vin = vin.clone();
        // Stored values are whole microseconds, so round the bounds inward
        let (from_us, to_us) = (micros_ceil(from), micros_floor(to));
        self.run(move |conn| {
            let aggregate = conn.query_row(
                "SELECT COUNT(*), MIN(soc), MAX(soc), MAX(max_temp), MIN(min_temp) \
                 FROM telemetry WHERE vin = ?1 AND ts_us >= ?2 AND ts_us <= ?3",
                params![vin.as_str(), from_us, to_us],
                |row| {
                    Ok(SummaryAggregate {
                        sample_count: row.get::<_, i64>(0)? as u64,
                        soc_min: row.get(1)?,
                        soc_max: row.get(2)?,
                        temp_max: row.get(3)?,
                        temp_min: row.get(4)?,
                    })
                },
            )?;
            Ok(aggregate)
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.run(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }
}

/// Raw column values of one `telemetry` row
struct StoredRow {
    vin: String,
    ts_us: i64,
    soc: Option<f64>,
    soh: Option<f64>,
    pack_voltage: Option<f64>,
    pack_current: Option<f64>,
    max_temp: Option<f64>,
    min_temp: Option<f64>,
    odo_km: Option<f64>,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        vin: row.get(0)?,
        ts_us: row.get(1)?,
        soc: row.get(2)?,
        soh: row.get(3)?,
        pack_voltage: row.get(4)?,
        pack_current: row.get(5)?,
        max_temp: row.get(6)?,
        min_temp: row.get(7)?,
        odo_km: row.get(8)?,
    })
}

/// Rebuild a sample from a stored row, re-checking its invariants.
fn restore_sample(row: StoredRow) -> Result<TelemetrySample> {
    let record = TelemetryRecord {
        soc: row.soc,
        soh: row.soh,
        pack_voltage: row.pack_voltage,
        pack_current: row.pack_current,
        max_temp: row.max_temp,
        min_temp: row.min_temp,
        odo_km: row.odo_km,
        ..TelemetryRecord::new(row.vin, from_micros(row.ts_us)?)
    };
    TelemetrySample::try_from(record)
        .map_err(|e| MonitorError::StoreUnavailable(format!("corrupt telemetry row: {}", e)))
}

fn micros_floor(ts: DateTime<Utc>) -> i64 {
    ts.timestamp() * 1_000_000 + i64::from(ts.timestamp_subsec_micros())
}

fn micros_ceil(ts: DateTime<Utc>) -> i64 {
    let partial = ts.timestamp_subsec_nanos() % 1_000 != 0;
    micros_floor(ts) + i64::from(partial)
}

fn from_micros(us: i64) -> Result<DateTime<Utc>> {
    let secs = us.div_euclid(1_000_000);
    let nanos = (us.rem_euclid(1_000_000) * 1_000) as u32;
    Utc.timestamp_opt(secs, nanos).single().ok_or_else(|| {
        MonitorError::StoreUnavailable(format!("stored timestamp out of range: {}", us))
    })
}
