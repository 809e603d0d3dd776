//! Per-user alert and notification counts

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;
use wsa_common::models::{Alert, Channel, DeliveryStatus, Notification};
use wsa_common::store::SosRepository;
use wsa_common::{time, Result};

/// Number of alerts echoed back in `recent_alerts`
pub const RECENT_ALERT_COUNT: usize = 5;

/// Notification counts by status and channel
///
/// Values this service does not know count towards `total` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationStats {
    pub total: usize,
    pub sent: usize,
    pub delivered: usize,
    pub failed: usize,
    pub sms: usize,
    pub email: usize,
    pub push: usize,
}

impl NotificationStats {
    pub fn from_notifications(notifications: &[Notification]) -> Self {
        let mut stats = Self {
            total: notifications.len(),
            ..Default::default()
        };

        for notification in notifications {
            match DeliveryStatus::parse(&notification.status) {
                Some(DeliveryStatus::Sent) => stats.sent += 1,
                Some(DeliveryStatus::Delivered) => stats.delivered += 1,
                Some(DeliveryStatus::Failed) => stats.failed += 1,
                Some(DeliveryStatus::Pending) | None => {}
            }
            match Channel::parse(&notification.channel) {
                Some(Channel::Sms) => stats.sms += 1,
                Some(Channel::Email) => stats.email += 1,
                Some(Channel::Push) => stats.push += 1,
                None => {}
            }
        }

        stats
    }
}

/// Analytics payload for `GET /api/analytics/:user_id`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub total_sos_alerts: usize,
    pub total_contacts: usize,
    pub total_notifications: usize,
    pub recent_alerts: Vec<Alert>,
    pub alerts_by_month: BTreeMap<String, usize>,
    pub notification_stats: NotificationStats,
}

impl AnalyticsReport {
    /// Aggregate already-fetched rows
    ///
    /// `alerts` are expected newest first; the first few become `recent_alerts`.
    pub fn compute(alerts: Vec<Alert>, total_contacts: usize, notifications: &[Notification]) -> Self {
        Self {
            total_sos_alerts: alerts.len(),
            total_contacts,
            total_notifications: notifications.len(),
            alerts_by_month: alerts_by_month(&alerts),
            notification_stats: NotificationStats::from_notifications(notifications),
            recent_alerts: alerts.into_iter().take(RECENT_ALERT_COUNT).collect(),
        }
    }
}

/// Count alerts per `YYYY-MM` of their creation time
///
/// Alerts without a parseable `created_at` are left out.
pub fn alerts_by_month(alerts: &[Alert]) -> BTreeMap<String, usize> {
    let mut monthly = BTreeMap::new();
    for month in alerts
        .iter()
        .filter_map(|alert| alert.created_at.as_deref())
        .filter_map(time::month_key)
    {
        *monthly.entry(month).or_insert(0) += 1;
    }
    monthly
}

/// Fetch and aggregate analytics for one user
///
/// Alert and contact lookups must succeed; a failing notifications lookup is
/// treated as "no notifications yet".
pub async fn analytics_for_user(repo: &SosRepository, user_id: &str) -> Result<AnalyticsReport> {
    let alerts = repo.alerts_for_user(user_id).await?;
    let contacts = repo.contacts_for_user(user_id).await?;

    let notifications = match repo.notifications_for_user(user_id).await {
        Ok(notifications) => notifications,
        Err(e) => {
            warn!(user_id, "Error getting notifications, counting none: {}", e);
            Vec::new()
        }
    };

    Ok(AnalyticsReport::compute(alerts, contacts.len(), &notifications))
}
