//! Integration tests for wsa-sos API endpoints
//!
//! Tests cover:
//! - POST /api/sos: creation, validation, store failure, notification fan-out
//! - GET /api/sos/:id
//! - GET /api/analytics/:user_id
//! - GET /api/notifications/:user_id and /api/notifications/sos/:sos_id
//! - GET /api/health
//! - GET /api/wolfram input validation
//!
//! The router runs over an in-memory store and the simulated notifier.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt; // for `oneshot` method
use wsa_common::models::tables;
use wsa_common::store::{MemoryStore, SosRepository, StoreOp};
use wsa_sos::notifier::{SimulatedNotifier, SIMULATED_MESSAGE_ID};
use wsa_sos::wolfram::WolframClient;
use wsa_sos::{build_router, AppState};

/// Test helper: Create app over a fresh in-memory store
fn setup_app() -> (Arc<MemoryStore>, axum::Router) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        SosRepository::new(store.clone()),
        Arc::new(SimulatedNotifier),
        WolframClient::new(None).expect("wolfram client"),
    );
    (store, build_router(state))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Poll `check` until it holds or two seconds pass
async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

fn seed_user_u1(store: &MemoryStore) {
    store.seed(
        tables::TRUSTED_CONTACTS,
        vec![
            json!({"id": "C1", "user_id": "U1", "name": "Asha", "phone": "+15550100", "relation": "sister"}),
            json!({"id": "C2", "user_id": "U1", "name": "Ravi", "phone": "", "email": "ravi@example.com"}),
        ],
    );
    store.seed(tables::PROFILES, vec![json!({"id": "U1", "full_name": "Priya"})]);
}

// =============================================================================
// POST /api/sos
// =============================================================================

#[tokio::test]
async fn test_create_sos_notifies_contacts_with_phone() {
    let (store, app) = setup_app();
    seed_user_u1(&store);

    let response = app
        .oneshot(post_json(
            "/api/sos",
            &json!({"user_id": "U1", "latitude": 12.9, "longitude": 77.6, "method": "button_press"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "SOS alert created successfully");
    let id = body["id"].as_str().expect("id in response").to_string();

    let alerts = store.rows(tables::SOS_ALERTS);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["id"], id.as_str());
    assert_eq!(alerts[0]["location"]["longitude"], 77.6);

    // Fan-out is detached: wait for both records to settle
    let settled = eventually(|| {
        let rows = store.rows(tables::NOTIFICATIONS);
        rows.len() == 2 && rows.iter().any(|r| r["status"] == "sent")
    })
    .await;
    assert!(settled, "notification records never settled");

    let rows = store.rows(tables::NOTIFICATIONS);
    assert!(rows.iter().all(|r| r["sos_id"] == id.as_str()));
    let sent: Vec<&Value> = rows.iter().filter(|r| r["status"] == "sent").collect();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["external_id"], SIMULATED_MESSAGE_ID);
    let pending: Vec<&Value> = rows.iter().filter(|r| r["status"] == "pending").collect();
    assert_eq!(pending.len(), 1, "phone-less contact keeps a pending record");
    assert_eq!(pending[0]["channel"], "SMS");
}

#[tokio::test]
async fn test_create_sos_without_location_marks_unavailable() {
    let (store, app) = setup_app();

    let response = app
        .oneshot(post_json("/api/sos", &json!({"user_id": "U9"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let alerts = store.rows(tables::SOS_ALERTS);
    let location = &alerts[0]["location"];
    assert_eq!(location["latitude"], Value::Null);
    assert_eq!(location["longitude"], Value::Null);
    assert_eq!(location["note"], "Location not available");
    assert_eq!(location["timestamp"], alerts[0]["timestamp"]);
    assert_eq!(alerts[0]["method"], "button_press");
}

#[tokio::test]
async fn test_create_sos_store_unreachable_returns_500() {
    let (store, app) = setup_app();
    seed_user_u1(&store);
    store.set_unreachable(true);

    let response = app
        .oneshot(post_json("/api/sos", &json!({"user_id": "U1", "latitude": 1.0, "longitude": 2.0})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Failed to create SOS alert");
    assert!(body["details"].is_string());

    store.set_unreachable(false);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.rows(tables::NOTIFICATIONS).is_empty());
    assert!(store.rows(tables::SOS_ALERTS).is_empty());
}

#[tokio::test]
async fn test_create_sos_contact_failure_does_not_change_response() {
    let (store, app) = setup_app();
    seed_user_u1(&store);
    store.fail(tables::TRUSTED_CONTACTS, StoreOp::Select);

    let response = app
        .oneshot(post_json("/api/sos", &json!({"user_id": "U1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(store.rows(tables::NOTIFICATIONS).is_empty());
}

#[tokio::test]
async fn test_create_sos_malformed_body_is_400() {
    let (store, app) = setup_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/sos")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());
    assert!(store.rows(tables::SOS_ALERTS).is_empty());
}

#[tokio::test]
async fn test_create_sos_wrong_field_type_is_400() {
    let (_, app) = setup_app();

    let response = app
        .oneshot(post_json("/api/sos", &json!({"user_id": "U1", "latitude": "north"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_sos_missing_user_is_400() {
    let (store, app) = setup_app();

    let response = app
        .oneshot(post_json("/api/sos", &json!({"latitude": 12.9, "longitude": 77.6})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.rows(tables::SOS_ALERTS).is_empty());
}

// =============================================================================
// GET /api/sos/:id
// =============================================================================

#[tokio::test]
async fn test_get_sos_returns_stored_alert() {
    let (store, app) = setup_app();
    store.seed(
        tables::SOS_ALERTS,
        vec![json!({
            "id": "A1",
            "user_id": "U1",
            "status": "sent",
            "method": "voice",
            "latitude": 12.9,
            "longitude": 77.6,
            "timestamp": "2025-01-01T10:00:00Z",
            "created_at": "2025-01-01T10:00:00Z"
        })],
    );

    let response = app.oneshot(get("/api/sos/A1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["id"], "A1");
    assert_eq!(body["status"], "sent");
    assert_eq!(body["method"], "voice");
}

#[tokio::test]
async fn test_get_sos_nonexistent_is_error() {
    let (_, app) = setup_app();

    let response = app.oneshot(get("/api/sos/nonexistent")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("Not found"));
}

// =============================================================================
// GET /api/analytics/:user_id
// =============================================================================

#[tokio::test]
async fn test_analytics_for_user_without_alerts() {
    let (_, app) = setup_app();

    let response = app.oneshot(get("/api/analytics/U0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_sos_alerts"], 0);
    assert_eq!(body["total_contacts"], 0);
    assert_eq!(body["recent_alerts"], json!([]));
    assert_eq!(body["alerts_by_month"], json!({}));
    assert_eq!(body["notification_stats"]["total"], 0);
}

#[tokio::test]
async fn test_analytics_counts() {
    let (store, app) = setup_app();
    seed_user_u1(&store);
    store.seed(
        tables::SOS_ALERTS,
        vec![
            json!({"id": "A1", "user_id": "U1", "status": "active", "created_at": "2025-01-03T00:00:00Z"}),
            json!({"id": "A2", "user_id": "U1", "status": "active", "created_at": "2025-02-03T00:00:00+00:00"}),
            json!({"id": "A3", "user_id": "U1", "status": "active", "created_at": "bogus"}),
            json!({"id": "B1", "user_id": "U2", "status": "active", "created_at": "2025-02-03T00:00:00Z"}),
        ],
    );
    store.seed(
        tables::NOTIFICATIONS,
        vec![
            json!({"id": "N1", "user_id": "U1", "sos_id": "A1", "channel": "SMS", "status": "sent"}),
            json!({"id": "N2", "user_id": "U1", "sos_id": "A1", "channel": "SMS", "status": "failed"}),
            json!({"id": "N3", "user_id": "U1", "sos_id": "A2", "channel": "Email", "status": "delivered"}),
        ],
    );

    let response = app.oneshot(get("/api/analytics/U1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_sos_alerts"], 3);
    assert_eq!(body["total_contacts"], 2);
    assert_eq!(body["total_notifications"], 3);
    assert_eq!(body["alerts_by_month"], json!({"2025-01": 1, "2025-02": 1}));
    assert_eq!(
        body["notification_stats"],
        json!({"total": 3, "sent": 1, "delivered": 1, "failed": 1, "sms": 2, "email": 1, "push": 0})
    );
    // Newest first
    assert_eq!(body["recent_alerts"][0]["id"], "A3");
}

#[tokio::test]
async fn test_analytics_tolerates_missing_notifications() {
    let (store, app) = setup_app();
    store.seed(
        tables::SOS_ALERTS,
        vec![json!({"id": "A1", "user_id": "U1", "status": "active"})],
    );
    store.fail(tables::NOTIFICATIONS, StoreOp::Select);

    let response = app.oneshot(get("/api/analytics/U1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_sos_alerts"], 1);
    assert_eq!(body["total_notifications"], 0);
}

#[tokio::test]
async fn test_analytics_alert_lookup_failure_is_500() {
    let (store, app) = setup_app();
    store.fail(tables::SOS_ALERTS, StoreOp::Select);

    let response = app.oneshot(get("/api/analytics/U1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Failed to get analytics data");
}

// =============================================================================
// Notification listings
// =============================================================================

#[tokio::test]
async fn test_notifications_listings() {
    let (store, app) = setup_app();
    store.seed(
        tables::NOTIFICATIONS,
        vec![
            json!({"id": "N1", "user_id": "U1", "sos_id": "A1", "channel": "SMS", "status": "sent", "created_at": "2025-01-01T00:00:00Z"}),
            json!({"id": "N2", "user_id": "U1", "sos_id": "A2", "channel": "SMS", "status": "failed", "created_at": "2025-01-02T00:00:00Z"}),
            json!({"id": "N3", "user_id": "U2", "sos_id": "A1", "channel": "SMS", "status": "pending", "created_at": "2025-01-03T00:00:00Z"}),
        ],
    );

    let response = app.clone().oneshot(get("/api/notifications/U1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["notifications"][0]["id"], "N2");
    assert_eq!(body["notifications"][1]["id"], "N1");

    let response = app.oneshot(get("/api/notifications/sos/A1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["notifications"][0]["id"], "N3");
}

#[tokio::test]
async fn test_notifications_store_failure_is_500() {
    let (store, app) = setup_app();
    store.fail(tables::NOTIFICATIONS, StoreOp::Select);

    let response = app.oneshot(get("/api/notifications/U1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "Failed to get notifications");
}

// =============================================================================
// Health and proxy
// =============================================================================

#[tokio::test]
async fn test_health_reports_store_state() {
    let (store, app) = setup_app();

    let response = app.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["module"], "wsa-sos");

    store.set_unreachable(true);
    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(body["database"].as_str().unwrap().starts_with("error: "));
}

#[tokio::test]
async fn test_wolfram_missing_query_is_400() {
    let (_, app) = setup_app();

    let response = app.clone().oneshot(get("/api/wolfram")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "missing q");

    let response = app.oneshot(get("/api/wolfram?q=")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wolfram_unconfigured_is_500() {
    let (_, app) = setup_app();

    let response = app.oneshot(get("/api/wolfram?q=2%2B2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_wolfram_undecodable_query_is_json_400() {
    let (_, app) = setup_app();

    let response = app.oneshot(get("/api/wolfram?q=a&q=b")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());
}

// =============================================================================
// Rows written by other clients
// =============================================================================

#[tokio::test]
async fn test_foreign_notification_values_are_listed_and_counted() {
    let (store, app) = setup_app();
    store.seed(
        tables::NOTIFICATIONS,
        vec![
            json!({"id": "N1", "user_id": "U1", "sos_id": "A1", "channel": "SMS", "status": "sent", "created_at": "2025-01-01T00:00:00Z"}),
            json!({"id": "N2", "user_id": "U1", "sos_id": "A1", "channel": "SMS", "status": "sent", "created_at": "2025-01-02T00:00:00Z"}),
            json!({"id": "N3", "user_id": "U1", "sos_id": "A1", "channel": "SMS", "status": "undelivered", "created_at": "2025-01-03T00:00:00Z"}),
        ],
    );

    let response = app.clone().oneshot(get("/api/notifications/U1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["notifications"][0]["status"], "undelivered");

    let response = app.clone().oneshot(get("/api/notifications/sos/A1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/analytics/U1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total_notifications"], 3);
    assert_eq!(body["notification_stats"]["sent"], 2);
    assert_eq!(body["notification_stats"]["failed"], 0);
}
