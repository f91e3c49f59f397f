//! # Telemetry Samples
//!
//! Wire shape of an inbound reading ([`TelemetryRecord`]) and the validated,
//! immutable form the rest of the system works with ([`TelemetrySample`]).
//!
//! The only way to obtain a `TelemetrySample` from untrusted input is
//! `TelemetrySample::try_from(record)`, which rejects:
//! - VINs shorter than 5 or longer than 40 characters
//! - `soc` / `soh` outside 0–100
//! - non-finite numbers in any field
//!
//! `min_temp` is not required to be below `max_temp`.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MonitorError, Result};

/// Minimum VIN length in characters
pub const VIN_MIN_LEN: usize = 5;

/// Maximum VIN length in characters
pub const VIN_MAX_LEN: usize = 40;

/// Vehicle identifier, the partition key for every query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    /// Parse a VIN, enforcing the 5–40 character length limit.
    ///
    /// # Errors
    ///
    /// Returns `MonitorError::InvalidInput` if the identifier is empty or
    /// its length falls outside the limit.
    ///
    /// # Examples
    ///
    /// ```
    /// use battery_monitor::telemetry::Vin;
    ///
    /// assert!(Vin::parse("5YJ3E1EA7KF000001").is_ok());
    /// assert!(Vin::parse("abc").is_err());
    /// ```
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let len = raw.chars().count();
        if len == 0 {
            return Err(MonitorError::InvalidInput("vin cannot be empty".to_string()));
        }
        if !(VIN_MIN_LEN..=VIN_MAX_LEN).contains(&len) {
            return Err(MonitorError::InvalidInput(format!(
                "vin must be between {} and {} characters, got {}",
                VIN_MIN_LEN, VIN_MAX_LEN, len
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Vin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One inbound batch item as it arrives on the wire.
///
/// Timestamps must carry an offset; they are converted to UTC on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub vin: String,
    #[serde(alias = "timestamp")]
    pub ts: DateTime<Utc>,
    #[serde(default)]
    pub soc: Option<f64>,
    #[serde(default)]
    pub soh: Option<f64>,
    #[serde(default)]
    pub pack_voltage: Option<f64>,
    #[serde(default)]
    pub pack_current: Option<f64>,
    #[serde(default)]
    pub max_temp: Option<f64>,
    #[serde(default)]
    pub min_temp: Option<f64>,
    #[serde(default, alias = "odometer_km")]
    pub odo_km: Option<f64>,
}

impl TelemetryRecord {
    /// Record with only the required fields set.
    pub fn new(vin: impl Into<String>, ts: DateTime<Utc>) -> Self {
        Self {
            vin: vin.into(),
            ts,
            soc: None,
            soh: None,
            pack_voltage: None,
            pack_current: None,
            max_temp: None,
            min_temp: None,
            odo_km: None,
        }
    }
}

/// A validated measurement for one vehicle at one instant.
///
/// Immutable once built. Timestamps are kept at microsecond precision, the
/// resolution the persistent store uses.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample {
    vin: Vin,
    timestamp: DateTime<Utc>,
    soc: Option<f64>,
    soh: Option<f64>,
    pack_voltage: Option<f64>,
    pack_current: Option<f64>,
    max_temp: Option<f64>,
    min_temp: Option<f64>,
    odometer_km: Option<f64>,
}

impl TelemetrySample {
    pub fn vin(&self) -> &Vin {
        &self.vin
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn soc(&self) -> Option<f64> {
        self.soc
    }

    pub fn soh(&self) -> Option<f64> {
        self.soh
    }

    pub fn pack_voltage(&self) -> Option<f64> {
        self.pack_voltage
    }

    pub fn pack_current(&self) -> Option<f64> {
        self.pack_current
    }

    pub fn max_temp(&self) -> Option<f64> {
        self.max_temp
    }

    pub fn min_temp(&self) -> Option<f64> {
        self.min_temp
    }

    pub fn odometer_km(&self) -> Option<f64> {
        self.odometer_km
    }
}

impl TryFrom<TelemetryRecord> for TelemetrySample {
    type Error = MonitorError;

    fn try_from(record: TelemetryRecord) -> Result<Self> {
        let vin = Vin::parse(record.vin)?;

        Ok(Self {
            vin,
            timestamp: record.ts.trunc_subsecs(6),
            soc: check_percentage("soc", record.soc)?,
            soh: check_percentage("soh", record.soh)?,
            pack_voltage: check_finite("pack_voltage", record.pack_voltage)?,
            pack_current: check_finite("pack_current", record.pack_current)?,
            max_temp: check_finite("max_temp", record.max_temp)?,
            min_temp: check_finite("min_temp", record.min_temp)?,
            odometer_km: check_finite("odo_km", record.odo_km)?,
        })
    }
}

fn check_finite(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Err(MonitorError::InvalidInput(format!(
            "{} must be a finite number, got {}",
            field, v
        ))),
        other => Ok(other),
    }
}

fn check_percentage(field: &str, value: Option<f64>) -> Result<Option<f64>> {
    match check_finite(field, value)? {
        Some(v) if !(0.0..=100.0).contains(&v) => Err(MonitorError::InvalidInput(format!(
            "{} must be between 0 and 100, got {}",
            field, v
        ))),
        other => Ok(other),
    }
}
