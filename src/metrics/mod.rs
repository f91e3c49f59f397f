//! # Derived Metrics Module
//!
//! Pure functions computing values that are never persisted, only derived
//! from a stored sample at query time.
//!
//! This module handles:
//! - Pack power from voltage and current
//! - Rule-based battery alerts (temperature, SOC, SOH)

pub mod alerts;
pub mod power;

pub use alerts::{compute_alerts, Alert, AlertCode, Severity};
pub use power::compute_power_kw;
