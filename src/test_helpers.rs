//! Shared helpers for the integration test suite. Builders create entities
//! through the public API so tests exercise the same code paths as clients,
//! following the object hierarchy: Screens -> Plates -> {Wells, Acquisitions}
//! -> WellSamples.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

/// Extract response body as JSON for testing
pub async fn extract_response_body(response: axum::response::Response) -> (StatusCode, Value) {
    use axum::body::to_bytes;

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body: Value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| json!({"error": "Invalid JSON response"}));
    (status, body)
}

pub async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    extract_response_body(response).await
}

pub async fn post_json(app: &axum::Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    extract_response_body(response).await
}

pub async fn put_json(app: &axum::Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    extract_response_body(response).await
}

pub async fn delete(app: &axum::Router, uri: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

fn id_from(body: &Value) -> Uuid {
    Uuid::parse_str(body["id"].as_str().expect("response carries an id")).unwrap()
}

/// Create a test screen with a unique name
pub async fn create_test_screen(app: &axum::Router) -> Uuid {
    let (status, body) = post_json(
        app,
        "/api/screens",
        &json!({
            "name": format!("Test Screen {}", Uuid::new_v4()),
            "description": "Screen created by test helper"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create screen: {body:?}");
    id_from(&body)
}

/// Create a test plate, optionally attached to a screen
pub async fn create_test_plate(app: &axum::Router, name: &str, screen_id: Option<Uuid>) -> Uuid {
    let (status, body) = post_json(
        app,
        "/api/plates",
        &json!({
            "name": name,
            "screen_id": screen_id
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create plate: {body:?}");
    id_from(&body)
}

/// Create a well at a 0-based (row, column) position on a plate
pub async fn create_test_well(
    app: &axum::Router,
    plate_id: Uuid,
    row_index: i32,
    column_index: i32,
) -> Uuid {
    let (status, body) = post_json(
        app,
        "/api/wells",
        &json!({
            "plate_id": plate_id,
            "row_index": row_index,
            "column_index": column_index
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create well: {body:?}");
    id_from(&body)
}

/// Create an acquisition (run) on a plate; `start_time` is RFC 3339
pub async fn create_test_acquisition(
    app: &axum::Router,
    plate_id: Uuid,
    name: &str,
    start_time: Option<&str>,
) -> Uuid {
    let (status, body) = post_json(
        app,
        "/api/acquisitions",
        &json!({
            "plate_id": plate_id,
            "name": name,
            "start_time": start_time
        }),
    )
    .await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Failed to create acquisition: {body:?}"
    );
    id_from(&body)
}

/// Create a well sample in a well, optionally associated with a run
pub async fn create_test_well_sample(
    app: &axum::Router,
    well_id: Uuid,
    plate_acquisition_id: Option<Uuid>,
) -> Uuid {
    let (status, body) = post_json(
        app,
        "/api/well_samples",
        &json!({
            "well_id": well_id,
            "plate_acquisition_id": plate_acquisition_id,
            "image_name": format!("image-{}.ome.tiff", Uuid::new_v4())
        }),
    )
    .await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Failed to create well sample: {body:?}"
    );
    id_from(&body)
}

/// Count the samples across all wells of a plate via `/api/plates/{id}/wells`
pub async fn count_plate_samples(app: &axum::Router, plate_id: Uuid) -> usize {
    let (status, body) = get_json(app, &format!("/api/plates/{plate_id}/wells")).await;
    assert_eq!(status, StatusCode::OK, "Failed to list plate wells: {body:?}");
    body.as_array()
        .expect("wells response is an array")
        .iter()
        .map(|well| well["samples"].as_array().map_or(0, Vec::len))
        .sum()
}
