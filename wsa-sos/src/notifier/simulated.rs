//! Notifier used when no SMS provider is configured

use async_trait::async_trait;
use tracing::info;

use super::{Notifier, NotifierError};

/// Message identifier returned for every simulated send
pub const SIMULATED_MESSAGE_ID: &str = "simulated-sid";

/// Logs the message instead of sending it and always succeeds
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedNotifier;

#[async_trait]
impl Notifier for SimulatedNotifier {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn send_sms(&self, to: &str, body: &str) -> Result<String, NotifierError> {
        info!(to, body, "📱 [SIMULATED] SMS");
        Ok(SIMULATED_MESSAGE_ID.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_send_returns_sentinel() {
        let id = SimulatedNotifier
            .send_sms("+15550100", "hello")
            .await
            .unwrap();
        assert_eq!(id, SIMULATED_MESSAGE_ID);
    }
}
