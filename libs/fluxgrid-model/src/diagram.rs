//! Diagram surface types
//!
//! Edges annotate energy-flow direction between points. They are
//! cosmetic: the flow compiler receives them but translates nothing.
//! `DiagramNode` is the read-only projection the renderer consumes; the
//! synchronization pipeline regenerates the full node set after every
//! applied batch so the renderer always observes a consistent snapshot.

use serde::{Deserialize, Serialize};

use crate::point::Position;

/// Cosmetic rendering hints for an edge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    /// Optional edge caption, e.g. "Solar → Load"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Stroke color, e.g. "#FFD700"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Animate the energy-flow dash pattern
    #[serde(default)]
    pub animated: bool,
}

/// A directed energy-flow edge between two measurement points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub id: String,

    /// Source point id
    pub source: String,

    /// Target point id
    pub target: String,

    #[serde(default)]
    pub style: EdgeStyle,
}

/// Renderer-facing snapshot of one point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    /// Formatted current value, e.g. "12.02 kW"
    pub value: String,
    pub icon: String,
    pub position: Position,
}
