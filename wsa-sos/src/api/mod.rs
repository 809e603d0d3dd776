//! HTTP API handlers for wsa-sos

pub mod analytics;
pub mod error;
pub mod health;
pub mod notifications;
pub mod sos;
pub mod wolfram;

pub use analytics::get_analytics;
pub use error::ApiError;
pub use health::health_routes;
pub use notifications::{get_notifications, get_notifications_by_sos};
pub use sos::{create_sos, get_sos_status};
pub use wolfram::wolfram_proxy;
