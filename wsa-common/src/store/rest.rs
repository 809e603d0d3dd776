//! PostgREST client
//!
//! Speaks the REST dialect exposed at `{url}/rest/v1`: one path segment per
//! table, `column=eq.value` filters, `order=column.desc`, and the
//! `application/vnd.pgrst.object+json` media type for single-row reads.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{Filter, Query, TableStore};
use crate::config::StoreConfig;
use crate::{Error, Result};

const USER_AGENT: &str = concat!("wsa/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const SINGLE_OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// Tabular store backed by a PostgREST endpoint
pub struct RestStore {
    http_client: reqwest::Client,
    base_url: String,
    key: String,
    schema: String,
}

impl RestStore {
    /// Build a client for the configured store
    ///
    /// Does not contact the store; use [`super::SosRepository::probe`] for that.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http_client,
            base_url: format!("{}/rest/v1", config.url.trim().trim_end_matches('/')),
            key: config.key.trim().to_string(),
            schema: config.schema.clone(),
        })
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Accept-Profile", &self.schema)
            .header("Content-Profile", &self.schema)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(Error::Store {
            status: status.as_u16(),
            message,
        })
    }
}

/// Query-string pairs for a select
fn select_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&query.filters));

    if let Some(column) = &query.order_desc {
        params.push(("order".to_string(), format!("{}.desc", column)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }

    params
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), format!("eq.{}", f.value)))
        .collect()
}

#[async_trait]
impl TableStore for RestStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        debug!(table = %query.table, filters = query.filters.len(), "Store select");

        let response = self
            .request(Method::GET, &query.table)
            .query(&select_params(query))
            .send()
            .await?;

        let rows: Vec<Value> = Self::check(response).await?.json().await?;
        Ok(rows)
    }

    async fn select_single(&self, query: &Query) -> Result<Value> {
        debug!(table = %query.table, filters = query.filters.len(), "Store select (single)");

        let response = self
            .request(Method::GET, &query.table)
            .query(&select_params(query))
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT_MEDIA_TYPE)
            .send()
            .await?;

        // PostgREST answers 406 when the object media type matches zero rows
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            let filters: Vec<String> = query
                .filters
                .iter()
                .map(|f| format!("{}={}", f.column, f.value))
                .collect();
            return Err(Error::NotFound(format!(
                "{} {}",
                query.table,
                filters.join(" ")
            )));
        }

        let row: Value = Self::check(response).await?.json().await?;
        Ok(row)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<()> {
        debug!(table, "Store insert");

        let response = self
            .request(Method::POST, table)
            .header("Prefer", "return=minimal")
            .json(&row)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn update(&self, table: &str, patch: Value, filter: &Filter) -> Result<()> {
        debug!(table, column = %filter.column, "Store update");

        let response = self
            .request(Method::PATCH, table)
            .query(&filter_params(std::slice::from_ref(filter)))
            .header("Prefer", "return=minimal")
            .json(&patch)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}
