//! SOS creation and notification fan-out
//!
//! `create_alert` persists the alert and returns as soon as the store accepts
//! it. Notification runs afterwards on a detached task: contacts and the
//! user's display name are looked up, then every contact is handled on its
//! own task (send SMS, insert the notification row, record the outcome).
//! Nothing that happens after the insert can change the create result.
//!
//! Failure handling on the detached side:
//! - contact lookup fails → logged, no notifications
//! - profile lookup fails → display name falls back to "Someone"
//! - send or row write fails for one contact → logged, other contacts unaffected
//!
//! Nothing is retried.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wsa_common::models::{
    Alert, Contact, DeliveryStatus, Notification, ALERT_STATUS_ACTIVE,
    DEFAULT_ALERT_METHOD, FALLBACK_DISPLAY_NAME,
};
use wsa_common::store::SosRepository;
use wsa_common::{time, uuid_utils, Error, Result};

use crate::notifier::{self, Notifier};

/// Note stored in the location descriptor when no coordinates were sent
pub const LOCATION_UNAVAILABLE_NOTE: &str = "Location not available";

/// Input for a new alert
#[derive(Debug, Clone, Default)]
pub struct CreateAlertInput {
    pub user_id: String,
    pub method: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Result of a successful `create_alert`
pub struct CreatedAlert {
    /// The alert exactly as persisted
    pub alert: Alert,
    /// Handle on the detached notification fan-out
    pub dispatch: DispatchHandle,
}

/// Handle on a detached fan-out
///
/// Dropping it leaves the fan-out running. Awaiting [`DispatchHandle::wait`]
/// is only for callers that want to observe completion (tests, tooling).
pub struct DispatchHandle(JoinHandle<DispatchReport>);

impl DispatchHandle {
    /// Wait for every per-contact task to finish
    ///
    /// Returns `None` if the fan-out task itself panicked.
    pub async fn wait(self) -> Option<DispatchReport> {
        match self.0.await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Notification fan-out task failed: {}", e);
                None
            }
        }
    }

    /// Let the fan-out run unobserved
    pub fn detach(self) {}
}

/// What happened to one contact's notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Provider accepted the SMS
    Sent,
    /// Provider call failed
    Failed,
    /// No phone number; row written, nothing sent
    Skipped,
}

/// Per-contact result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactOutcome {
    pub contact_id: String,
    pub notification_id: String,
    pub delivery: DeliveryOutcome,
    /// Every store write for this contact succeeded
    pub recorded: bool,
}

/// Summary of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Contact lookup failed; nothing was attempted
    pub contacts_unavailable: bool,
    pub display_name: String,
    pub outcomes: Vec<ContactOutcome>,
    /// Per-contact tasks that panicked or were cancelled
    pub aborted: usize,
}

impl DispatchReport {
    fn count(&self, delivery: DeliveryOutcome) -> usize {
        self.outcomes.iter().filter(|o| o.delivery == delivery).count()
    }

    pub fn sent(&self) -> usize {
        self.count(DeliveryOutcome::Sent)
    }

    pub fn failed(&self) -> usize {
        self.count(DeliveryOutcome::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(DeliveryOutcome::Skipped)
    }

    pub fn unrecorded(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.recorded).count()
    }
}

/// Location descriptor stored with every alert
///
/// Coordinates are only embedded when both are present and non-zero.
pub fn location_descriptor(latitude: Option<f64>, longitude: Option<f64>, timestamp: &str) -> Value {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => json!({
            "latitude": lat,
            "longitude": lon,
            "timestamp": timestamp,
        }),
        _ => json!({
            "latitude": null,
            "longitude": null,
            "timestamp": timestamp,
            "note": LOCATION_UNAVAILABLE_NOTE,
        }),
    }
}

/// Fixed per-alert data every contact task needs
struct AlertMessage {
    sos_id: String,
    body: String,
}

/// Creates alerts and fans out their notifications
#[derive(Clone)]
pub struct SosOrchestrator {
    repo: SosRepository,
    notifier: Arc<dyn Notifier>,
}

impl SosOrchestrator {
    pub fn new(repo: SosRepository, notifier: Arc<dyn Notifier>) -> Self {
        Self { repo, notifier }
    }

    /// Validate, persist, and start notifying contacts
    ///
    /// Fails with `InvalidInput` before touching the store when `user_id` is
    /// blank, or with the store error when the insert fails. In both cases no
    /// notification is attempted.
    pub async fn create_alert(&self, input: CreateAlertInput) -> Result<CreatedAlert> {
        let user_id = input.user_id.trim();
        if user_id.is_empty() {
            return Err(Error::InvalidInput("user_id is required".to_string()));
        }

        let now = time::now_rfc3339();
        let method = input
            .method
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_ALERT_METHOD.to_string());

        let alert = Alert {
            id: uuid_utils::generate_id(),
            user_id: user_id.to_string(),
            location: Some(location_descriptor(input.latitude, input.longitude, &now)),
            timestamp: Some(now.clone()),
            status: ALERT_STATUS_ACTIVE.to_string(),
            method: Some(method),
            latitude: input.latitude,
            longitude: input.longitude,
            created_at: Some(now),
        };

        debug!(sos_id = %alert.id, user_id = %alert.user_id, "Inserting SOS alert");
        if let Err(e) = self.repo.insert_alert(&alert).await {
            error!(user_id = %alert.user_id, "Error inserting SOS alert: {}", e);
            return Err(e);
        }
        info!(
            sos_id = %alert.id,
            user_id = %alert.user_id,
            method = alert.method.as_deref().unwrap_or_default(),
            "🚨 SOS alert created"
        );

        let dispatch = self.spawn_dispatch(alert.clone());
        Ok(CreatedAlert { alert, dispatch })
    }

    /// Fetch an alert exactly as stored
    pub async fn get_alert_status(&self, id: &str) -> Result<Alert> {
        self.repo.find_alert(id).await
    }

    fn spawn_dispatch(&self, alert: Alert) -> DispatchHandle {
        let orchestrator = self.clone();
        DispatchHandle(tokio::spawn(async move {
            orchestrator.dispatch_notifications(&alert).await
        }))
    }

    /// Notify every trusted contact of `alert`, one task per contact
    pub async fn dispatch_notifications(&self, alert: &Alert) -> DispatchReport {
        let contacts = match self.repo.contacts_for_user(&alert.user_id).await {
            Ok(contacts) => contacts,
            Err(e) => {
                warn!(
                    sos_id = %alert.id,
                    user_id = %alert.user_id,
                    "Error getting trusted contacts, no notifications sent: {}",
                    e
                );
                return DispatchReport {
                    contacts_unavailable: true,
                    ..Default::default()
                };
            }
        };

        let display_name = match self.repo.find_profile(&alert.user_id).await {
            Ok(profile) => profile.display_name().to_string(),
            Err(e) => {
                debug!(user_id = %alert.user_id, "Profile lookup failed, using fallback name: {}", e);
                FALLBACK_DISPLAY_NAME.to_string()
            }
        };

        info!(
            sos_id = %alert.id,
            contacts = contacts.len(),
            latitude = alert.latitude.unwrap_or_default(),
            longitude = alert.longitude.unwrap_or_default(),
            "Notifying trusted contacts"
        );

        let timestamp = alert
            .timestamp
            .as_deref()
            .or(alert.created_at.as_deref())
            .unwrap_or_default();
        let message = Arc::new(AlertMessage {
            sos_id: alert.id.clone(),
            body: notifier::sos_message(&display_name, alert.latitude, alert.longitude, timestamp),
        });

        let tasks: Vec<JoinHandle<ContactOutcome>> = contacts
            .into_iter()
            .map(|contact| {
                let orchestrator = self.clone();
                let message = Arc::clone(&message);
                tokio::spawn(async move { orchestrator.notify_contact(contact, &message).await })
            })
            .collect();

        let mut report = DispatchReport {
            display_name,
            ..Default::default()
        };
        for task in tasks {
            match task.await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(e) => {
                    error!(sos_id = %alert.id, "Contact notification task failed: {}", e);
                    report.aborted += 1;
                }
            }
        }

        info!(
            sos_id = %alert.id,
            sent = report.sent(),
            failed = report.failed(),
            skipped = report.skipped(),
            unrecorded = report.unrecorded(),
            "Notification fan-out complete"
        );
        report
    }

    async fn notify_contact(&self, contact: Contact, message: &AlertMessage) -> ContactOutcome {
        let notification = Notification::pending_sms(
            uuid_utils::generate_id(),
            contact.user_id.clone(),
            message.sos_id.clone(),
            time::now_rfc3339(),
        );

        debug!(contact_id = %contact.id, name = %contact.name, "📱 Notifying contact");

        let sent = match contact.sms_number() {
            Some(phone) => Some(self.notifier.send_sms(phone, &message.body).await),
            None => {
                debug!(contact_id = %contact.id, "Contact has no phone number, nothing sent");
                None
            }
        };

        let mut recorded = true;
        if let Err(e) = self.repo.insert_notification(&notification).await {
            warn!(
                notification_id = %notification.id,
                contact_id = %contact.id,
                "Error creating notification record: {}",
                e
            );
            recorded = false;
        }

        let delivery = match sent {
            None => DeliveryOutcome::Skipped,
            Some(result) => {
                let (status, external_id, delivery) = match &result {
                    Ok(message_id) => (
                        DeliveryStatus::Sent,
                        Some(message_id.as_str()),
                        DeliveryOutcome::Sent,
                    ),
                    Err(e) => {
                        warn!(
                            contact_id = %contact.id,
                            notifier = self.notifier.name(),
                            "Error sending SMS: {}",
                            e
                        );
                        (DeliveryStatus::Failed, None, DeliveryOutcome::Failed)
                    }
                };

                if let Err(e) = self
                    .repo
                    .record_delivery(&notification.id, status, external_id)
                    .await
                {
                    warn!(
                        notification_id = %notification.id,
                        "Error updating notification status: {}",
                        e
                    );
                    recorded = false;
                }
                delivery
            }
        };

        ContactOutcome {
            contact_id: contact.id,
            notification_id: notification.id,
            delivery,
            recorded,
        }
    }
}
