//! API route configuration
//!
//! Central route definition for all flowsrv endpoints.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::api::{
    apply_values, export_flows, get_device, health_check, list_connections, list_edges,
    list_nodes, list_points, list_values, run_simulation, update_device,
};
use crate::app_state::AppState;

pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Diagram surface
        .route("/api/v1/diagram/nodes", get(list_nodes))
        .route("/api/v1/diagram/edges", get(list_edges))
        // Value store & synchronization
        .route("/api/v1/values", get(list_values))
        .route("/api/v1/values/batch", post(apply_values))
        .route("/api/v1/simulate", post(run_simulation))
        // Device & connection registry
        .route("/api/v1/points", get(list_points))
        .route(
            "/api/v1/points/{id}/device",
            get(get_device).put(update_device),
        )
        .route("/api/v1/connections", get(list_connections))
        // Flow export
        .route("/api/v1/flows/export", post(export_flows))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
