//! # HTTP API Module
//!
//! Thin axum layer over the ingestion and query services.
//!
//! Routes (the `/api/telemetry/...` forms are compatibility aliases):
//! - `POST /api/telemetry`, `POST /api/telemetry/ingest`
//! - `GET  /api/vehicles/{vin}/latest`, `GET /api/telemetry/latest?vin=`
//! - `GET  /api/vehicles/{vin}/summary?from_ts=&to_ts=`,
//!   `GET /api/telemetry/summary?vin=&from_ts=&to_ts=`
//! - `GET  /api/health`

pub mod handlers;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::MonitorError;
use crate::service::{IngestService, QueryService};
use crate::store::TelemetryStore;

/// Shared state handed to every handler
pub struct AppState {
    pub ingest: IngestService,
    pub query: QueryService,
}

impl AppState {
    pub fn new(store: Arc<dyn TelemetryStore>) -> Self {
        Self {
            ingest: IngestService::new(Arc::clone(&store)),
            query: QueryService::new(store),
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Build the router with every route bound to `state`.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/telemetry", post(handlers::ingest))
        .route("/api/telemetry/ingest", post(handlers::ingest))
        .route("/api/telemetry/latest", get(handlers::latest_by_query))
        .route("/api/telemetry/summary", get(handlers::summary_by_query))
        .route("/api/vehicles/:vin/latest", get(handlers::latest_by_path))
        .route("/api/vehicles/:vin/summary", get(handlers::summary_by_path))
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: SharedState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Battery Monitor API listening on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// JSON body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl MonitorError {
    fn status_code(&self) -> StatusCode {
        match self {
            MonitorError::InvalidInput(_) | MonitorError::InvalidRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            MonitorError::NotFound(_) => StatusCode::NOT_FOUND,
            MonitorError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            MonitorError::Config(_) | MonitorError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for MonitorError {
    fn from(rejection: JsonRejection) -> Self {
        MonitorError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for MonitorError {
    fn from(rejection: QueryRejection) -> Self {
        MonitorError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for MonitorError {
    fn from(rejection: PathRejection) -> Self {
        MonitorError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
