//! Request handlers. Each one decodes its inputs and delegates to a service.
//!
//! Extractor rejections (malformed JSON, a timestamp without an offset, a
//! missing field) are turned into `MonitorError::InvalidInput` so every
//! failure carries the same JSON error body.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SharedState;
use crate::error::Result;
use crate::service::{HealthStatus, LatestReading, SummaryReport};
use crate::telemetry::TelemetryRecord;

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub inserted_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct VinParams {
    pub vin: String,
}

#[derive(Debug, Deserialize)]
pub struct WindowParams {
    pub from_ts: DateTime<Utc>,
    pub to_ts: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct VinWindowParams {
    pub vin: String,
    pub from_ts: DateTime<Utc>,
    pub to_ts: DateTime<Utc>,
}

pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthStatus>) {
    let health = state.query.health().await;
    let status = if health.store_reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(health))
}

pub async fn ingest(
    State(state): State<SharedState>,
    payload: std::result::Result<Json<Vec<TelemetryRecord>>, JsonRejection>,
) -> Result<Json<IngestResponse>> {
    let Json(batch) = payload?;
    let inserted_count = state.ingest.ingest(batch).await?;
    Ok(Json(IngestResponse { inserted_count }))
}

pub async fn latest_by_path(
    State(state): State<SharedState>,
    vin: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<LatestReading>> {
    let Path(vin) = vin?;
    Ok(Json(state.query.get_latest(&vin).await?))
}

pub async fn latest_by_query(
    State(state): State<SharedState>,
    params: std::result::Result<Query<VinParams>, QueryRejection>,
) -> Result<Json<LatestReading>> {
    let Query(params) = params?;
    Ok(Json(state.query.get_latest(&params.vin).await?))
}

pub async fn summary_by_path(
    State(state): State<SharedState>,
    vin: std::result::Result<Path<String>, PathRejection>,
    window: std::result::Result<Query<WindowParams>, QueryRejection>,
) -> Result<Json<SummaryReport>> {
    let (Path(vin), Query(window)) = (vin?, window?);
    let report = state
        .query
        .get_summary(&vin, window.from_ts, window.to_ts)
        .await?;
    Ok(Json(report))
}

pub async fn summary_by_query(
    State(state): State<SharedState>,
    params: std::result::Result<Query<VinWindowParams>, QueryRejection>,
) -> Result<Json<SummaryReport>> {
    let Query(params) = params?;
    let report = state
        .query
        .get_summary(&params.vin, params.from_ts, params.to_ts)
        .await?;
    Ok(Json(report))
}
