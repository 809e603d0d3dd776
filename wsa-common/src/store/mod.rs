//! Tabular store access
//!
//! The backend keeps all state in a remote tabular store addressed by table
//! name. [`TableStore`] is the seam: [`RestStore`] talks PostgREST over HTTP,
//! [`MemoryStore`] keeps rows in process for tests and local runs.
//! [`SosRepository`] layers the typed per-table operations on top.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::Result;

mod memory;
mod repository;
mod rest;

pub use memory::{MemoryStore, StoreOp};
pub use repository::SosRepository;
pub use rest::RestStore;

/// Equality filter on one column (`column = value`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// A filtered select against one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    /// Column to sort on, newest (largest) first
    pub order_desc: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    /// Select all rows of `table`
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order_desc: None,
            limit: None,
        }
    }

    /// Add an equality filter
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    /// Order by `column` descending
    pub fn order_desc(mut self, column: impl Into<String>) -> Self {
        self.order_desc = Some(column.into());
        self
    }

    /// Cap the number of returned rows
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Remote tabular store operations
///
/// Rows travel as JSON objects; callers decode them into their own models
/// with [`decode_rows`] / [`decode_row`].
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Return every row matching `query`, in the store's order
    async fn select(&self, query: &Query) -> Result<Vec<Value>>;

    /// Return exactly one row matching `query`
    ///
    /// Fails with [`crate::Error::NotFound`] when no row matches.
    async fn select_single(&self, query: &Query) -> Result<Value>;

    /// Insert one row given as a partial-field map
    async fn insert(&self, table: &str, row: Value) -> Result<()>;

    /// Apply a partial-field map to every row matching `filter`
    async fn update(&self, table: &str, patch: Value, filter: &Filter) -> Result<()>;
}

/// Decode a list of rows into a caller model
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

/// Decode a single row into a caller model
pub fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T> {
    Ok(serde_json::from_value(row)?)
}
