//! Twilio SMS client
//!
//! `POST {base}/2010-04-01/Accounts/{sid}/Messages.json` with form fields
//! `To`, `From`, `Body` and HTTP basic auth (account SID / auth token).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use wsa_common::config::TwilioConfig;

use super::{Notifier, NotifierError};

const TWILIO_BASE_URL: &str = "https://api.twilio.com";
const USER_AGENT: &str = concat!("wsa-sos/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Subset of the Twilio message resource we read back
#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
}

/// Twilio error payload
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: Option<String>,
}

/// Twilio REST API client
pub struct TwilioNotifier {
    http_client: reqwest::Client,
    base_url: String,
    config: TwilioConfig,
}

impl TwilioNotifier {
    pub fn new(config: TwilioConfig) -> Result<Self, NotifierError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| NotifierError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: TWILIO_BASE_URL.to_string(),
            config,
        })
    }

    /// Point the client at another API host (local test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url, self.config.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    fn name(&self) -> &'static str {
        "twilio"
    }

    async fn send_sms(&self, to: &str, body: &str) -> Result<String, NotifierError> {
        let from = self.config.phone_number.as_deref().ok_or_else(|| {
            NotifierError::NotConfigured("Twilio phone number not configured".to_string())
        })?;

        let params = [("To", to), ("From", from), ("Body", body)];

        debug!(to, "Sending SMS via Twilio");

        let response = self
            .http_client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| NotifierError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioErrorBody>(&raw)
                .ok()
                .and_then(|body| body.message)
                .unwrap_or(raw);
            warn!(to, status = status.as_u16(), %message, "❌ Error sending SMS");
            return Err(NotifierError::Provider(status.as_u16(), message));
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| NotifierError::Parse(e.to_string()))?;

        info!(to, sid = %resource.sid, "✓ SMS sent");
        Ok(resource.sid)
    }
}
