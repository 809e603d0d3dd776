//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use wsa_common::time;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub module: String,
    pub version: String,
    pub timestamp: String,
    /// "connected" or "error: ..." from a store round trip
    pub database: String,
}

/// GET /api/health
///
/// Always 200; store trouble is reported in `database`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.repo.probe().await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Women Safety Assistant API is running".to_string(),
        module: "wsa-sos".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: time::now_rfc3339(),
        database,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
