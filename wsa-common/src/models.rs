//! Row models for the tables the backend reads and writes

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Table names as exposed by the store
pub mod tables {
    pub const SOS_ALERTS: &str = "sos_alerts";
    pub const TRUSTED_CONTACTS: &str = "trusted_contacts";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const PROFILES: &str = "profiles";
}

/// Status written to every newly created alert
pub const ALERT_STATUS_ACTIVE: &str = "active";

/// Method recorded when the client does not say how the alert was raised
pub const DEFAULT_ALERT_METHOD: &str = "button_press";

/// Display name used when the alerting user's profile has no usable name
pub const FALLBACK_DISPLAY_NAME: &str = "Someone";

/// One SOS event raised by a user (`sos_alerts`)
///
/// `status` is kept as free text: other clients write values this service
/// never produces, and reads must return them untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub status: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A person designated to receive a user's emergency notifications (`trusted_contacts`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Contact {
    /// Phone number usable for an SMS, if any
    pub fn sms_number(&self) -> Option<&str> {
        self.phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
    }
}

/// Delivery channel of a notification
///
/// The `channel` column is free text; these are the values the service
/// writes and counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Sms,
    Email,
    Push,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Sms => "SMS",
            Channel::Email => "Email",
            Channel::Push => "Push",
        }
    }

    /// Recognise a stored column value; anything else is `None`
    pub fn parse(value: &str) -> Option<Self> {
        [Channel::Sms, Channel::Email, Channel::Push]
            .into_iter()
            .find(|channel| channel.as_str() == value)
    }
}

/// Delivery status of a notification
///
/// This service moves records `Pending` → `Sent` | `Failed`. `Delivered` and
/// any other value are only ever written outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
        }
    }

    /// Recognise a stored column value; anything else is `None`
    pub fn parse(value: &str) -> Option<Self> {
        [
            DeliveryStatus::Pending,
            DeliveryStatus::Sent,
            DeliveryStatus::Delivered,
            DeliveryStatus::Failed,
        ]
        .into_iter()
        .find(|status| status.as_str() == value)
    }
}

/// One notification attempt for an (alert, contact) pair (`notifications`)
///
/// `channel` and `status` stay free text so rows written by other clients
/// are listed as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub sos_id: String,
    pub channel: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Notification {
    /// New `pending` SMS record for one contact of an alert
    pub fn pending_sms(id: String, user_id: String, sos_id: String, created_at: String) -> Self {
        Self {
            id,
            user_id,
            sos_id,
            channel: Channel::Sms.as_str().to_string(),
            status: DeliveryStatus::Pending.as_str().to_string(),
            external_id: None,
            created_at: Some(created_at),
        }
    }
}

/// User profile (`profiles`); only `full_name` matters to the alert flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Profile {
    /// Name shown in outgoing alert messages
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
    }
}
