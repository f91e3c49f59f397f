//! # Pack Power
//!
//! `power_kw = voltage * current / 1000`, rounded to 4 decimal places.
//!
//! Current is signed, so power carries the same sign: positive while the pack
//! is being charged, negative while it discharges (or the other way round,
//! depending on the BMS convention; no interpretation happens here).

/// Decimal places kept in the computed power
pub const POWER_DECIMALS: i32 = 4;

/// Compute pack power in kilowatts.
///
/// # Arguments
///
/// * `voltage` - Pack voltage in volts
/// * `current` - Pack current in amps (signed)
///
/// # Returns
///
/// * `Option<f64>` - Power in kW, or `None` if either input is absent
///
/// # Examples
///
/// ```
/// use battery_monitor::metrics::compute_power_kw;
///
/// assert_eq!(compute_power_kw(Some(400.0), Some(100.0)), Some(40.0));
/// assert_eq!(compute_power_kw(Some(400.0), None), None);
/// ```
#[must_use]
pub fn compute_power_kw(voltage: Option<f64>, current: Option<f64>) -> Option<f64> {
    let (v, a) = (voltage?, current?);
    Some(round_to(v * a / 1000.0, POWER_DECIMALS))
}

/// Round the scaled value half away from zero.
///
/// The rounding happens after scaling, so a product whose binary value sits
/// just below a decimal tie (e.g. `0.00015`) rounds up in the last place
/// rather than down as a round-the-exact-binary rule would.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
