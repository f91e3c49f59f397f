//! # Telemetry Module
//!
//! Battery/vehicle telemetry data model.
//!
//! This module handles:
//! - Decoding inbound readings from the wire format
//! - Validating readings into immutable samples
//! - Aggregating samples over a time window

pub mod sample;
pub mod summary;

pub use sample::{TelemetryRecord, TelemetrySample, Vin};
pub use summary::SummaryAggregate;
