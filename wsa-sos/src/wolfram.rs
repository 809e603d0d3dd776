//! Wolfram|Alpha query proxy client
//!
//! Forwards one free-text query to the v2 query API with the server-held app
//! id and hands back the upstream status, content type and body untouched.

use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const WOLFRAM_QUERY_URL: &str = "https://api.wolframalpha.com/v2/query";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Proxy errors
#[derive(Debug, Error)]
pub enum WolframError {
    #[error("Wolfram app id not configured")]
    NotConfigured,

    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// Upstream answer passed through verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Wolfram|Alpha API client
pub struct WolframClient {
    http_client: reqwest::Client,
    endpoint: String,
    app_id: Option<String>,
}

impl WolframClient {
    pub fn new(app_id: Option<String>) -> Result<Self, WolframError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| WolframError::Upstream(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: WOLFRAM_QUERY_URL.to_string(),
            app_id,
        })
    }

    /// Point the client at another endpoint (local test servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.app_id.is_some()
    }

    /// Run `input` against the query API
    pub async fn query(&self, input: &str) -> Result<UpstreamResponse, WolframError> {
        let app_id = self.app_id.as_deref().ok_or(WolframError::NotConfigured)?;

        debug!(input, "Forwarding Wolfram query");

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("appid", app_id), ("input", input), ("output", "json")])
            .send()
            .await
            .map_err(|e| WolframError::Upstream(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| WolframError::Upstream(e.to_string()))?
            .to_vec();

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
