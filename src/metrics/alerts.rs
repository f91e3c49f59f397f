//! # Battery Alerts
//!
//! Rule-based alerts evaluated against a single sample.
//!
//! Checks run in a fixed order: temperature, then SOC, then SOH. A check is
//! skipped when its field is absent. Within one metric the RED rule wins over
//! the YELLOW rule, so each metric contributes at most one alert.
//!
//! | Metric     | Condition | Code           | Severity |
//! |------------|-----------|----------------|----------|
//! | `max_temp` | >= 60.0   | `HIGH_TEMP`    | RED      |
//! | `max_temp` | >= 50.0   | `TEMP_WARNING` | YELLOW   |
//! | `soc`      | <= 10.0   | `LOW_SOC`      | RED      |
//! | `soc`      | <= 20.0   | `SOC_WARNING`  | YELLOW   |
//! | `soh`      | < 80.0    | `SOH_DEGRADED` | YELLOW   |

use serde::Serialize;
use std::fmt;

use crate::telemetry::TelemetrySample;

/// Pack temperature (°C) at or above which a RED alert is raised
pub const TEMP_RED: f64 = 60.0;

/// Pack temperature (°C) at or above which a YELLOW alert is raised
pub const TEMP_YELLOW: f64 = 50.0;

/// State of charge (%) at or below which a RED alert is raised
pub const SOC_RED: f64 = 10.0;

/// State of charge (%) at or below which a YELLOW alert is raised
pub const SOC_YELLOW: f64 = 20.0;

/// State of health (%) below which the pack is reported as degraded
pub const SOH_DEGRADED: f64 = 80.0;

/// Alert severity
///
/// `Green` is part of the severity scale but no current rule produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Green,
    Yellow,
    Red,
}

/// Symbolic alert identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCode {
    HighTemp,
    TempWarning,
    LowSoc,
    SocWarning,
    SohDegraded,
}

impl fmt::Display for AlertCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            AlertCode::HighTemp => "HIGH_TEMP",
            AlertCode::TempWarning => "TEMP_WARNING",
            AlertCode::LowSoc => "LOW_SOC",
            AlertCode::SocWarning => "SOC_WARNING",
            AlertCode::SohDegraded => "SOH_DEGRADED",
        };
        f.write_str(code)
    }
}

/// An alert derived from one sample. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub code: AlertCode,
    pub severity: Severity,
    pub message: String,
}

impl Alert {
    fn new(code: AlertCode, severity: Severity, message: String) -> Self {
        Self { code, severity, message }
    }
}

/// Evaluate every alert rule against a sample.
///
/// # Returns
///
/// * `Vec<Alert>` - Alerts in rule order (temperature, SOC, SOH); empty if
///   nothing triggered
pub fn compute_alerts(sample: &TelemetrySample) -> Vec<Alert> {
    [
        temperature_alert(sample.max_temp()),
        soc_alert(sample.soc()),
        soh_alert(sample.soh()),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn temperature_alert(max_temp: Option<f64>) -> Option<Alert> {
    let t = max_temp?;
    if t >= TEMP_RED {
        Some(Alert::new(
            AlertCode::HighTemp,
            Severity::Red,
            format!("Pack temperature high: {:.1}°C (>= {:.1}°C)", t, TEMP_RED),
        ))
    } else if t >= TEMP_YELLOW {
        Some(Alert::new(
            AlertCode::TempWarning,
            Severity::Yellow,
            format!("Pack temperature elevated: {:.1}°C (>= {:.1}°C)", t, TEMP_YELLOW),
        ))
    } else {
        None
    }
}

fn soc_alert(soc: Option<f64>) -> Option<Alert> {
    let s = soc?;
    if s <= SOC_RED {
        Some(Alert::new(
            AlertCode::LowSoc,
            Severity::Red,
            format!("State of charge critical: {:.1}% (<= {:.1}%)", s, SOC_RED),
        ))
    } else if s <= SOC_YELLOW {
        Some(Alert::new(
            AlertCode::SocWarning,
            Severity::Yellow,
            format!("State of charge low: {:.1}% (<= {:.1}%)", s, SOC_YELLOW),
        ))
    } else {
        None
    }
}

fn soh_alert(soh: Option<f64>) -> Option<Alert> {
    let h = soh?;
    (h < SOH_DEGRADED).then(|| {
        Alert::new(
            AlertCode::SohDegraded,
            Severity::Yellow,
            format!("State of health degraded: {:.1}% (< {:.1}%)", h, SOH_DEGRADED),
        )
    })
}
