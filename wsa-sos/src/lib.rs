//! wsa-sos library - SOS alert service
//!
//! Creates SOS alerts, fans notifications out to trusted contacts over SMS,
//! and serves alert, notification and analytics lookups plus a Wolfram|Alpha
//! query proxy.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use wsa_common::store::SosRepository;

pub mod analytics;
pub mod api;
pub mod notifier;
pub mod orchestrator;
pub mod wolfram;

use notifier::Notifier;
use orchestrator::SosOrchestrator;
use wolfram::WolframClient;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub repo: SosRepository,
    pub orchestrator: SosOrchestrator,
    pub wolfram: Arc<WolframClient>,
}

impl AppState {
    /// Wire the service from its process-scoped dependencies
    pub fn new(repo: SosRepository, notifier: Arc<dyn Notifier>, wolfram: WolframClient) -> Self {
        Self {
            orchestrator: SosOrchestrator::new(repo.clone(), notifier),
            repo,
            wolfram: Arc::new(wolfram),
        }
    }
}

/// Build application router
///
/// Every route lives under `/api`. No authentication layer.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let api = Router::new()
        .route("/sos", post(api::create_sos))
        .route("/sos/:id", get(api::get_sos_status))
        .route("/analytics/:user_id", get(api::get_analytics))
        .route("/notifications/:user_id", get(api::get_notifications))
        .route("/notifications/sos/:sos_id", get(api::get_notifications_by_sos))
        .route("/wolfram", get(api::wolfram_proxy))
        .merge(api::health_routes());

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
