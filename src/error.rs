//! # Error Types
//!
//! Custom error types for Battery Monitor using `thiserror`.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for Battery Monitor
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Empty batch or a field outside its valid range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No telemetry recorded for the requested vehicle
    #[error("No telemetry found for VIN {0}")]
    NotFound(String),

    /// Query window whose end does not come after its start
    #[error("Invalid time range: to_ts ({to}) must be after from_ts ({from})")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    /// Telemetry store failed or could not be reached
    #[error("Telemetry store unavailable: {0}")]
    StoreUnavailable(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    /// Short machine-readable name of the error kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::InvalidInput(_) => "invalid_input",
            MonitorError::NotFound(_) => "not_found",
            MonitorError::InvalidRange { .. } => "invalid_range",
            MonitorError::StoreUnavailable(_) => "store_unavailable",
            MonitorError::Config(_) => "config",
            MonitorError::Io(_) => "io",
        }
    }
}

impl From<rusqlite::Error> for MonitorError {
    fn from(e: rusqlite::Error) -> Self {
        MonitorError::StoreUnavailable(e.to_string())
    }
}

impl From<tokio::task::JoinError> for MonitorError {
    fn from(e: tokio::task::JoinError) -> Self {
        MonitorError::StoreUnavailable(format!("store task failed: {}", e))
    }
}

/// Result type alias for Battery Monitor
pub type Result<T> = std::result::Result<T, MonitorError>;
