//! # WSA Common Library
//!
//! Shared code for the Women Safety Assistant backend including:
//! - Data model for the `sos_alerts`, `trusted_contacts`, `notifications`
//!   and `profiles` tables
//! - Tabular store client (PostgREST over HTTP) and an in-memory store
//! - Configuration loading
//! - Utility functions

pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use store::TableStore;
