//! # Battery Monitor Library
//!
//! Ingest battery/vehicle telemetry and answer queries for the latest reading
//! and windowed summaries per vehicle.
//!
//! This library provides the telemetry data model, the derived-metric and
//! alerting rules, the storage contract with SQLite and in-memory backends,
//! the ingestion/query services, and the HTTP layer on top of them.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod service;
pub mod store;
pub mod telemetry;
