//! In-process tabular store
//!
//! Keeps rows as JSON objects per table and evaluates the same equality
//! filters and ordering as the REST store. Operations can be made to fail per
//! table, or all at once to stand in for an unreachable store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{Filter, Query, TableStore};
use crate::{Error, Result};

/// Store operation kinds, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
}

/// Tabular store held in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    failing: Mutex<HashSet<(String, StoreOp)>>,
    unreachable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows to `table`
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.entry(table.to_string()).or_default().extend(rows);
    }

    /// Snapshot of every row in `table`, in insertion order
    pub fn rows(&self, table: &str) -> Vec<Value> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.get(table).cloned().unwrap_or_default()
    }

    /// Make `op` on `table` fail until cleared
    pub fn fail(&self, table: &str, op: StoreOp) {
        let mut failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        failing.insert((table.to_string(), op));
    }

    /// Make every operation fail as if the store could not be reached
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check(&self, table: &str, op: StoreOp) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Store {
                status: 503,
                message: "store unreachable".to_string(),
            });
        }

        let failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        if failing.contains(&(table.to_string(), op)) {
            return Err(Error::Store {
                status: 500,
                message: format!("injected {:?} failure on {}", op, table),
            });
        }
        Ok(())
    }

    fn query_rows(&self, query: &Query) -> Vec<Value> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let mut rows: Vec<Value> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| query.filters.iter().all(|f| matches_filter(row, f)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(column) = &query.order_desc {
            rows.sort_by(|a, b| column_text(b, column).cmp(&column_text(a, column)));
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        rows
    }
}

/// Text form of a column, as PostgREST compares it in `eq.` filters
fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    column_text(row, &filter.column).as_deref() == Some(filter.value.as_str())
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        self.check(&query.table, StoreOp::Select)?;
        Ok(self.query_rows(query))
    }

    async fn select_single(&self, query: &Query) -> Result<Value> {
        self.check(&query.table, StoreOp::Select)?;
        let mut rows = self.query_rows(query);
        match rows.len() {
            1 => Ok(rows.remove(0)),
            0 => Err(Error::NotFound(query.table.clone())),
            n => Err(Error::Store {
                status: 406,
                message: format!("{} rows matched a single-row select on {}", n, query.table),
            }),
        }
    }

    async fn insert(&self, table: &str, row: Value) -> Result<()> {
        self.check(table, StoreOp::Insert)?;
        if !row.is_object() {
            return Err(Error::InvalidInput(format!("row for {} is not an object", table)));
        }

        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    async fn update(&self, table: &str, patch: Value, filter: &Filter) -> Result<()> {
        self.check(table, StoreOp::Update)?;
        let patch: Map<String, Value> = match patch {
            Value::Object(map) => map,
            _ => {
                return Err(Error::InvalidInput(format!(
                    "patch for {} is not an object",
                    table
                )))
            }
        };

        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| matches_filter(row, filter)) {
                if let Value::Object(fields) = row {
                    for (key, value) in &patch {
                        fields.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        Ok(())
    }
}
