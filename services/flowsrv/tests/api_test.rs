//! HTTP API integration tests
//!
//! Drives the router directly with `tower::ServiceExt::oneshot`; no
//! sockets are opened.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use flowsrv::app_state::AppState;
use flowsrv::config::FlowsrvConfig;
use flowsrv::routes::create_routes;

/// Build a router over a fresh state; artifacts land in the tempdir
fn test_app() -> (TempDir, Arc<AppState>, Router) {
    let dir = TempDir::new().unwrap();
    let mut config = FlowsrvConfig::default();
    config.export.output_dir = dir.path().to_str().unwrap().to_string();

    let state = Arc::new(AppState::from_config(config));
    let app = create_routes(state.clone());
    (dir, state, app)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_topology_counts() {
    let (_dir, _state, app) = test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["points"], 4);
    assert_eq!(json["connections"], 2);
}

#[tokio::test]
async fn diagram_nodes_render_seeded_values() {
    let (_dir, _state, app) = test_app();
    let response = app.oneshot(get("/api/v1/diagram/nodes")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    let nodes = json["data"].as_array().unwrap();
    assert_eq!(nodes.len(), 4);
    let solar = nodes.iter().find(|n| n["id"] == "solar").unwrap();
    assert_eq!(solar["value"], "12.02 kW");
}

#[tokio::test]
async fn batch_apply_updates_the_value_store() {
    let (_dir, state, app) = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/values/batch",
            serde_json::json!([
                { "pointId": "solar", "value": 18.5 },
                { "pointId": "windmill", "value": 1.0 }
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["applied"], 1);
    assert_eq!(json["data"]["total"], 2);

    assert_eq!(state.store.get("solar").unwrap().value, 18.5);

    // the projection the renderer reads was regenerated
    let response = app.oneshot(get("/api/v1/diagram/nodes")).await.unwrap();
    let json = body_json(response).await;
    let solar = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == "solar")
        .unwrap()
        .clone();
    assert_eq!(solar["value"], "18.50 kW");
}

#[tokio::test]
async fn simulate_applies_every_point() {
    let (_dir, _state, app) = test_app();
    let response = app
        .oneshot(post_json("/api/v1/simulate", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["applied"], 4);
}

#[tokio::test]
async fn malformed_update_is_rejected_without_merging() {
    let (_dir, state, app) = test_app();
    let before = state.registry.device("solar").unwrap();

    let response = app
        .oneshot(put_json(
            "/api/v1/points/solar/device",
            serde_json::json!({ "address": "90", "quantity": "ten" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], 400);

    // nothing was merged, not even the well-formed field
    assert_eq!(state.registry.device("solar").unwrap(), before);
}

#[tokio::test]
async fn update_merges_and_returns_the_descriptor() {
    let (_dir, state, app) = test_app();

    let response = app
        .oneshot(put_json(
            "/api/v1/points/solar/device",
            serde_json::json!({ "address": "90", "scaleFactor": "0.01" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["address"], 90);
    assert_eq!(json["data"]["scale_factor"], 0.01);

    let device = state.registry.device("solar").unwrap();
    assert_eq!(device.address, 90);
    assert_eq!(device.quantity, 10);
}

#[tokio::test]
async fn updating_an_unknown_point_is_not_found() {
    let (_dir, _state, app) = test_app();
    let response = app
        .oneshot(put_json(
            "/api/v1/points/windmill/device",
            serde_json::json!({ "address": "1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_returns_the_artifact_and_writes_the_sink() {
    let (dir, _state, app) = test_app();

    let response = app
        .oneshot(post_json("/api/v1/flows/export", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("flows.json"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let flows: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let array = flows.as_array().unwrap();
    assert_eq!(array.len(), 15);
    assert_eq!(array[0]["type"], "tab");

    // the file sink observed the same bytes
    let written = std::fs::read(dir.path().join("flows.json")).unwrap();
    assert_eq!(written, bytes.to_vec());
}
