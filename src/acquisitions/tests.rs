use crate::config::test_helpers::setup_test_app;
use crate::test_helpers::{
    create_test_acquisition, create_test_plate, delete, get_json, put_json,
};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn acquisition_crud_operations() {
    let app = setup_test_app().await;

    let plate_id = create_test_plate(&app, "Acquisition CRUD plate", None).await;
    let run_id =
        create_test_acquisition(&app, plate_id, "Run 2026-03-14", Some("2026-03-14T08:30:00Z"))
            .await;

    let (status, body) = get_json(&app, &format!("/api/acquisitions/{run_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plate_id"], json!(plate_id));
    assert_eq!(body["name"], "Run 2026-03-14");
    assert!(body["start_time"].as_str().unwrap().starts_with("2026-03-14T08:30:00"));

    let (update_status, update_body) = put_json(
        &app,
        &format!("/api/acquisitions/{run_id}"),
        &json!({
            "plate_id": plate_id,
            "name": "Run 2026-03-14 (repeat)",
            "start_time": "2026-03-14T08:30:00Z"
        }),
    )
    .await;
    assert_eq!(update_status, StatusCode::OK, "{update_body:?}");
    assert_eq!(update_body["name"], "Run 2026-03-14 (repeat)");

    let delete_status = delete(&app, &format!("/api/acquisitions/{run_id}")).await;
    assert_eq!(delete_status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn acquisitions_may_lack_a_start_time() {
    let app = setup_test_app().await;

    let plate_id = create_test_plate(&app, "Untimed run plate", None).await;
    let run_id = create_test_acquisition(&app, plate_id, "Untimed run", None).await;

    let (status, body) = get_json(&app, &format!("/api/acquisitions/{run_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["start_time"].is_null());
}
