//! Wolfram|Alpha proxy endpoint

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::warn;

use super::ApiError;
use crate::wolfram::WolframError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WolframQuery {
    pub q: Option<String>,
}

/// GET /api/wolfram?q=
///
/// Upstream status, content type and body are passed through unchanged.
pub async fn wolfram_proxy(
    State(state): State<AppState>,
    query: Result<Query<WolframQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let input = query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing q".to_string()))?;

    let upstream = state.wolfram.query(&input).await.map_err(|e| match e {
        WolframError::NotConfigured => ApiError::internal(e.to_string()),
        WolframError::Upstream(message) => {
            warn!("Wolfram upstream failure: {}", message);
            ApiError::BadGateway(message)
        }
    })?;

    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((
        status,
        [(header::CONTENT_TYPE, upstream.content_type)],
        upstream.body,
    )
        .into_response())
}
