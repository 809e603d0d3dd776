//! SMS notifier
//!
//! One operation: send a text to a phone number and get back the provider's
//! message identifier. [`TwilioNotifier`] talks to the Twilio REST API;
//! [`SimulatedNotifier`] stands in when no credentials are configured so the
//! alert flow still runs end to end.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use wsa_common::config::TwilioConfig;

mod simulated;
mod twilio;

pub use simulated::{SimulatedNotifier, SIMULATED_MESSAGE_ID};
pub use twilio::TwilioNotifier;

/// Notifier errors
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error {0}: {1}")]
    Provider(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),
}

/// Sends a single SMS
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name for logs ("twilio", "simulated", ...)
    fn name(&self) -> &'static str;

    /// Send `body` to `to`, returning the provider message identifier
    async fn send_sms(&self, to: &str, body: &str) -> Result<String, NotifierError>;
}

/// Pick the notifier for the configured credentials
pub fn from_config(twilio: Option<&TwilioConfig>) -> Result<Arc<dyn Notifier>, NotifierError> {
    match twilio {
        Some(config) => {
            if config.phone_number.is_none() {
                warn!("TWILIO_PHONE_NUMBER not set; every SMS send will fail");
            }
            let notifier = TwilioNotifier::new(config.clone())?;
            info!("✓ Twilio client initialized");
            Ok(Arc::new(notifier))
        }
        None => {
            warn!("Twilio credentials not found. SMS notifications will be simulated.");
            Ok(Arc::new(SimulatedNotifier))
        }
    }
}

/// Text of the SMS sent to each trusted contact
///
/// Missing coordinates render as zero, matching what the map link has always
/// shown for alerts raised without a location fix.
pub fn sos_message(
    display_name: &str,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timestamp: &str,
) -> String {
    format!(
        "🚨 EMERGENCY ALERT: {} needs help! Location: https://maps.google.com/?q={:.6},{:.6} (as of {}). Please contact emergency services immediately.",
        display_name,
        latitude.unwrap_or(0.0),
        longitude.unwrap_or(0.0),
        timestamp
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sos_message_contains_name_and_map_link() {
        let message = sos_message("Priya", Some(12.9), Some(77.6), "2025-01-01T10:00:00Z");
        assert_eq!(
            message,
            "🚨 EMERGENCY ALERT: Priya needs help! Location: https://maps.google.com/?q=12.900000,77.600000 (as of 2025-01-01T10:00:00Z). Please contact emergency services immediately."
        );
    }

    #[test]
    fn test_sos_message_without_location() {
        let message = sos_message("Someone", None, None, "t");
        assert!(message.contains("?q=0.000000,0.000000"));
        assert!(message.starts_with("🚨 EMERGENCY ALERT: Someone needs help!"));
    }

    #[test]
    fn test_from_config_without_credentials_simulates() {
        let notifier = from_config(None).unwrap();
        assert_eq!(notifier.name(), "simulated");
    }

    #[test]
    fn test_from_config_with_credentials_uses_twilio() {
        let config = TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            phone_number: Some("+15550000000".to_string()),
        };
        let notifier = from_config(Some(&config)).unwrap();
        assert_eq!(notifier.name(), "twilio");
    }

    #[test]
    fn test_notifier_error_display() {
        let err = NotifierError::Provider(400, "invalid To number".to_string());
        assert_eq!(err.to_string(), "Provider error 400: invalid To number");
    }
}
