//! # Service Module
//!
//! Orchestration between callers and the telemetry store.
//!
//! This module handles:
//! - Validating and persisting inbound batches ([`IngestService`])
//! - Latest-reading lookups with derived metrics ([`QueryService`])
//! - Windowed summaries and store health ([`QueryService`])
//!
//! Services hold no mutable state; everything lives in the store.

pub mod ingest;
pub mod query;

pub use ingest::IngestService;
pub use query::{HealthStatus, LatestReading, QueryService, SummaryReport};
