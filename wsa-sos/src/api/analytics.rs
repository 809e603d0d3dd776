//! Analytics endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::error;

use super::ApiError;
use crate::analytics::{analytics_for_user, AnalyticsReport};
use crate::AppState;

/// GET /api/analytics/:user_id
pub async fn get_analytics(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    analytics_for_user(&state.repo, &user_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!(user_id = %user_id, "Error building analytics: {}", e);
            ApiError::internal("Failed to get analytics data")
        })
}
