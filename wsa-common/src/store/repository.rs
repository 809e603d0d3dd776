//! Typed table operations used by the SOS service
//!
//! Alert store, contact directory, notification store and profile lookup all
//! live in the same tabular store; this wrapper names the queries once.

use serde_json::{json, Value};
use std::sync::Arc;

use super::{decode_row, decode_rows, Filter, Query, TableStore};
use crate::models::{tables, Alert, Contact, DeliveryStatus, Notification, Profile};
use crate::Result;

/// Typed access to the backend's tables
#[derive(Clone)]
pub struct SosRepository {
    store: Arc<dyn TableStore>,
}

impl SosRepository {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Cheap round trip used by health checks and startup
    pub async fn probe(&self) -> Result<()> {
        self.store
            .select(&Query::table(tables::SOS_ALERTS).limit(1))
            .await
            .map(|_| ())
    }

    // ------------------------------------------------------------------
    // Alerts
    // ------------------------------------------------------------------

    pub async fn insert_alert(&self, alert: &Alert) -> Result<()> {
        self.store
            .insert(tables::SOS_ALERTS, serde_json::to_value(alert)?)
            .await
    }

    pub async fn find_alert(&self, id: &str) -> Result<Alert> {
        let row = self
            .store
            .select_single(&Query::table(tables::SOS_ALERTS).eq("id", id))
            .await?;
        decode_row(row)
    }

    /// Alerts raised by a user, newest first
    pub async fn alerts_for_user(&self, user_id: &str) -> Result<Vec<Alert>> {
        self.select_as(
            Query::table(tables::SOS_ALERTS)
                .eq("user_id", user_id)
                .order_desc("created_at"),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Contacts and profiles
    // ------------------------------------------------------------------

    pub async fn contacts_for_user(&self, user_id: &str) -> Result<Vec<Contact>> {
        self.select_as(Query::table(tables::TRUSTED_CONTACTS).eq("user_id", user_id))
            .await
    }

    pub async fn find_profile(&self, user_id: &str) -> Result<Profile> {
        let row = self
            .store
            .select_single(&Query::table(tables::PROFILES).eq("id", user_id))
            .await?;
        decode_row(row)
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.store
            .insert(tables::NOTIFICATIONS, serde_json::to_value(notification)?)
            .await
    }

    /// Record the provider outcome on an existing notification row
    pub async fn record_delivery(
        &self,
        notification_id: &str,
        status: DeliveryStatus,
        external_id: Option<&str>,
    ) -> Result<()> {
        let patch: Value = json!({
            "status": status.as_str(),
            "external_id": external_id,
        });
        self.store
            .update(
                tables::NOTIFICATIONS,
                patch,
                &Filter::eq("id", notification_id),
            )
            .await
    }

    /// Notifications for a recipient, newest first
    pub async fn notifications_for_user(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.select_as(
            Query::table(tables::NOTIFICATIONS)
                .eq("user_id", user_id)
                .order_desc("created_at"),
        )
        .await
    }

    /// Notifications raised by one alert, newest first
    pub async fn notifications_for_alert(&self, sos_id: &str) -> Result<Vec<Notification>> {
        self.select_as(
            Query::table(tables::NOTIFICATIONS)
                .eq("sos_id", sos_id)
                .order_desc("created_at"),
        )
        .await
    }

    async fn select_as<T: serde::de::DeserializeOwned>(&self, query: Query) -> Result<Vec<T>> {
        let rows = self.store.select(&query).await?;
        decode_rows(rows)
    }
}
