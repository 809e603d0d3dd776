//! Notification listing endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::error;
use wsa_common::models::Notification;

use super::ApiError;
use crate::AppState;

/// Notification list response
#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub total: usize,
}

impl From<Vec<Notification>> for NotificationsResponse {
    fn from(notifications: Vec<Notification>) -> Self {
        Self {
            total: notifications.len(),
            notifications,
        }
    }
}

/// GET /api/notifications/:user_id
///
/// Newest first.
pub async fn get_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    match state.repo.notifications_for_user(&user_id).await {
        Ok(notifications) => Ok(Json(notifications.into())),
        Err(e) => {
            error!(user_id = %user_id, "Error getting notifications: {}", e);
            Err(ApiError::internal("Failed to get notifications"))
        }
    }
}

/// GET /api/notifications/sos/:sos_id
///
/// Newest first.
pub async fn get_notifications_by_sos(
    State(state): State<AppState>,
    Path(sos_id): Path<String>,
) -> Result<Json<NotificationsResponse>, ApiError> {
    match state.repo.notifications_for_alert(&sos_id).await {
        Ok(notifications) => Ok(Json(notifications.into())),
        Err(e) => {
            error!(sos_id = %sos_id, "Error getting notifications for SOS: {}", e);
            Err(ApiError::internal("Failed to get notifications"))
        }
    }
}
