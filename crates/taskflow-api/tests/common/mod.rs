//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use taskflow_core::clock::Clock;
use taskflow_event_bus::InMemoryEventBus;
use taskflow_event_store::InMemoryEventStore;
use taskflow_test_support::StepClock;
use tower::ServiceExt;

use taskflow_api::state::AppState;

/// Clock starting at a fixed instant and advancing one millisecond per read.
fn step_clock() -> Arc<dyn Clock> {
    Arc::new(StepClock::new(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
        1,
    ))
}

/// Fresh in-memory application state.
pub fn test_state() -> AppState {
    AppState::new(
        Arc::new(InMemoryEventStore::new()),
        Arc::new(InMemoryEventBus::new()),
        step_clock(),
        "ws-test",
    )
}

/// Build the full app router over `state`. Uses the same route structure as `main.rs`.
pub fn build_test_app(state: &AppState) -> Router {
    taskflow_api::app(state.clone())
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Create a task and submit it for QC in one correlation.
/// Returns `(task_id, created_event_id, submitted_event_id)`.
pub async fn create_and_submit(state: &AppState, correlation_id: &str) -> (String, String, String) {
    let (status, created) = post_json(
        build_test_app(state),
        "/api/v1/tasks",
        &serde_json::json!({ "title": "Write docs", "correlation_id": correlation_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let task_id = created["aggregate_id"].as_str().unwrap().to_owned();
    let created_id = created["event_ids"][0].as_str().unwrap().to_owned();

    let (status, submitted) = post_json(
        build_test_app(state),
        &format!("/api/v1/tasks/{task_id}/submit"),
        &serde_json::json!({ "correlation_id": correlation_id, "causation_id": created_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let submitted_id = submitted["event_ids"][0].as_str().unwrap().to_owned();

    (task_id, created_id, submitted_id)
}
