//! Windowed aggregate over a vehicle's samples.

use serde::Serialize;

use super::sample::TelemetrySample;

/// Count and extremes over the samples of one `(vin, from_ts, to_ts)` window.
///
/// Every extreme is `None` when no sample in the window carried the
/// corresponding field, including the empty window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SummaryAggregate {
    #[serde(rename = "samples")]
    pub sample_count: u64,
    pub soc_min: Option<f64>,
    pub soc_max: Option<f64>,
    /// Highest per-sample `max_temp`
    pub temp_max: Option<f64>,
    /// Lowest per-sample `min_temp`
    pub temp_min: Option<f64>,
}

impl SummaryAggregate {
    /// Fold one more sample into the aggregate.
    pub fn accumulate(&mut self, sample: &TelemetrySample) {
        self.sample_count += 1;
        self.soc_min = pick(self.soc_min, sample.soc(), f64::min);
        self.soc_max = pick(self.soc_max, sample.soc(), f64::max);
        self.temp_max = pick(self.temp_max, sample.max_temp(), f64::max);
        self.temp_min = pick(self.temp_min, sample.min_temp(), f64::min);
    }

    /// True when no sample fell inside the window
    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

impl<'a> FromIterator<&'a TelemetrySample> for SummaryAggregate {
    fn from_iter<I: IntoIterator<Item = &'a TelemetrySample>>(iter: I) -> Self {
        let mut aggregate = Self::default();
        for sample in iter {
            aggregate.accumulate(sample);
        }
        aggregate
    }
}

fn pick(current: Option<f64>, next: Option<f64>, f: fn(f64, f64) -> f64) -> Option<f64> {
    match (current, next) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (a, b) => a.or(b),
    }
}
