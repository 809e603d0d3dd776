//! SOS alert endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use wsa_common::models::Alert;
use wsa_common::Error;

use super::ApiError;
use crate::orchestrator::CreateAlertInput;
use crate::AppState;

/// Body of `POST /api/sos`
///
/// Unknown fields (clients also send `status`, `location`) are ignored.
#[derive(Debug, Deserialize)]
pub struct CreateSosRequest {
    #[serde(default)]
    pub user_id: String,
    pub method: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CreateSosResponse {
    pub message: String,
    pub id: String,
}

/// POST /api/sos
///
/// Returns 201 once the alert is stored. Contacts are notified afterwards;
/// nothing about that affects this response.
pub async fn create_sos(
    State(state): State<AppState>,
    payload: Result<Json<CreateSosRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSosResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let input = CreateAlertInput {
        user_id: request.user_id,
        method: request.method,
        latitude: request.latitude,
        longitude: request.longitude,
    };

    match state.orchestrator.create_alert(input).await {
        Ok(created) => {
            created.dispatch.detach();
            Ok((
                StatusCode::CREATED,
                Json(CreateSosResponse {
                    message: "SOS alert created successfully".to_string(),
                    id: created.alert.id,
                }),
            ))
        }
        Err(Error::InvalidInput(message)) => Err(ApiError::BadRequest(message)),
        Err(e) => Err(ApiError::internal_with_details("Failed to create SOS alert", e)),
    }
}

/// GET /api/sos/:id
///
/// Returns the stored alert verbatim. A missing alert is an error, never an
/// empty record.
pub async fn get_sos_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Alert>, ApiError> {
    state
        .orchestrator
        .get_alert_status(&id)
        .await
        .map(Json)
        .map_err(|e| {
            error!(sos_id = %id, "Error fetching SOS alert: {}", e);
            ApiError::internal(e.to_string())
        })
}
