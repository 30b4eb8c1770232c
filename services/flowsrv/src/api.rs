//! HTTP API handlers
//!
//! The editing UI is the only intended consumer. Handlers translate
//! between the wire envelope and the core subsystems; no compilation or
//! synchronization logic lives here.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use errors::{AppError, SuccessResponse};
use fluxgrid_model::{
    ConnectionConfig, DeviceDescriptor, DeviceUpdate, DiagramEdge, DiagramNode, MeasurementPoint,
};

use crate::app_state::AppState;
use crate::flow;
use crate::store::PointValue;
use crate::sync::FeedEntry;

/// Health check endpoint
///
/// @route GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": state.config.service.name,
        "points": state.registry.points().len(),
        "connections": state.registry.connections().len(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Current diagram node projection
///
/// @route GET /api/v1/diagram/nodes
pub async fn list_nodes(
    State(state): State<Arc<AppState>>,
) -> Json<SuccessResponse<Vec<DiagramNode>>> {
    Json(SuccessResponse::new(state.sync.nodes().as_ref().clone()))
}

/// Configured diagram edges
///
/// @route GET /api/v1/diagram/edges
pub async fn list_edges(
    State(state): State<Arc<AppState>>,
) -> Json<SuccessResponse<Vec<DiagramEdge>>> {
    Json(SuccessResponse::new(state.registry.edges().to_vec()))
}

/// Value store snapshot
///
/// @route GET /api/v1/values
pub async fn list_values(
    State(state): State<Arc<AppState>>,
) -> Json<SuccessResponse<HashMap<String, PointValue>>> {
    Json(SuccessResponse::new(state.store.snapshot()))
}

/// Result of one applied feed batch
#[derive(Debug, Serialize, Deserialize)]
pub struct ApplyReport {
    pub applied: usize,
    pub total: usize,
}

/// Apply one measurement feed batch
///
/// Unknown point ids are skipped, not errors. A batch arriving while
/// another is applied is rejected with 409.
///
/// @route POST /api/v1/values/batch
pub async fn apply_values(
    State(state): State<Arc<AppState>>,
    Json(entries): Json<Vec<FeedEntry>>,
) -> Result<Json<SuccessResponse<ApplyReport>>, AppError> {
    let applied = state.sync.apply_batch(&entries).await?;
    Ok(Json(SuccessResponse::new(ApplyReport {
        applied,
        total: entries.len(),
    })))
}

/// Apply one synthetic uniform-random batch
///
/// @route POST /api/v1/simulate
pub async fn run_simulation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse<ApplyReport>>, AppError> {
    let total = state.registry.points().len();
    let applied = state.sync.simulate().await?;
    Ok(Json(SuccessResponse::new(ApplyReport { applied, total })))
}

/// All measurement points with their descriptors
///
/// @route GET /api/v1/points
pub async fn list_points(
    State(state): State<Arc<AppState>>,
) -> Json<SuccessResponse<Vec<MeasurementPoint>>> {
    Json(SuccessResponse::new(state.registry.points()))
}

/// One point's device descriptor
///
/// @route GET /api/v1/points/{id}/device
pub async fn get_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse<DeviceDescriptor>>, AppError> {
    let device = state.registry.device(&id)?;
    Ok(Json(SuccessResponse::new(device)))
}

/// Merge a partial descriptor update into one point
///
/// Numeric fields arrive as text; a parse failure rejects the whole
/// update with 400 and nothing is merged.
///
/// @route PUT /api/v1/points/{id}/device
pub async fn update_device(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<DeviceUpdate>,
) -> Result<Json<SuccessResponse<DeviceDescriptor>>, AppError> {
    state.registry.update_device(&id, &update)?;
    let device = state.registry.device(&id)?;
    Ok(Json(SuccessResponse::new(device)))
}

/// All shared connections
///
/// @route GET /api/v1/connections
pub async fn list_connections(
    State(state): State<Arc<AppState>>,
) -> Json<SuccessResponse<Vec<ConnectionConfig>>> {
    Json(SuccessResponse::new(state.registry.connections()))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Overrides the configured artifact filename
    pub filename: Option<String>,
}

/// Compile the topology and export the flow artifact
///
/// Writes the artifact through the configured sink and returns the
/// bytes as an attachment download.
///
/// @route POST /api/v1/flows/export
pub async fn export_flows(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let points = state.registry.points();
    let program = state.compiler.compile(&points, state.registry.edges());
    let bytes = flow::serialize(&program)?;

    let filename = query
        .filename
        .unwrap_or_else(|| state.config.export.filename.clone());
    state.sink.emit(&filename, &bytes).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}
