//! Topology registry
//!
//! Owns the canonical tables the rest of the service reads: the ordered
//! measurement-point list (each point carrying its device descriptor),
//! the deduplicated connection table, and the cosmetic edge list. The
//! registry is passed explicitly to every subsystem at construction —
//! there is no ambient global.
//!
//! One logical writer (the configuration-update path) is assumed; reads
//! are unbounded and take short `parking_lot` guards.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::info;

use errors::{FluxGridError, Result};
use fluxgrid_model::{
    ConnectionConfig, DeviceDescriptor, DeviceUpdate, DiagramEdge, MeasurementPoint,
};

use crate::config::TopologyConfig;

pub struct TopologyRegistry {
    /// Ordered point list; order is the compiler's input order
    points: RwLock<Vec<MeasurementPoint>>,

    /// Connection id → shared transport configuration
    connections: RwLock<HashMap<String, ConnectionConfig>>,

    /// Fixed at configuration time, cosmetic only
    edges: Vec<DiagramEdge>,
}

impl TopologyRegistry {
    pub fn from_topology(topology: TopologyConfig) -> Self {
        let connections = topology
            .connections
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        Self {
            points: RwLock::new(topology.points),
            connections: RwLock::new(connections),
            edges: topology.edges,
        }
    }

    /// Ordered snapshot of all measurement points
    pub fn points(&self) -> Vec<MeasurementPoint> {
        self.points.read().clone()
    }

    /// Look up one point by id
    pub fn point(&self, point_id: &str) -> Option<MeasurementPoint> {
        self.points.read().iter().find(|p| p.id == point_id).cloned()
    }

    /// Resolve a point's device descriptor
    pub fn device(&self, point_id: &str) -> Result<DeviceDescriptor> {
        self.points
            .read()
            .iter()
            .find(|p| p.id == point_id)
            .map(|p| p.device.clone())
            .ok_or_else(|| FluxGridError::not_found(format!("point '{point_id}'")))
    }

    /// Resolve a shared connection configuration
    pub fn connection(&self, connection_id: &str) -> Result<ConnectionConfig> {
        self.connections
            .read()
            .get(connection_id)
            .cloned()
            .ok_or_else(|| FluxGridError::not_found(format!("connection '{connection_id}'")))
    }

    /// Snapshot of all connections
    pub fn connections(&self) -> Vec<ConnectionConfig> {
        let mut all: Vec<_> = self.connections.read().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// The configured edge list
    pub fn edges(&self) -> &[DiagramEdge] {
        &self.edges
    }

    /// Apply a partial descriptor update to one point
    ///
    /// The text form is parsed in full before any state is touched; a
    /// malformed field rejects the update and leaves the descriptor
    /// exactly as it was. The merged point replaces the old one under
    /// the write lock, so readers see either the old or the new record,
    /// never a half-updated one.
    pub fn update_device(&self, point_id: &str, update: &DeviceUpdate) -> Result<()> {
        let patch = update.parse()?;

        let mut points = self.points.write();
        let slot = points
            .iter_mut()
            .find(|p| p.id == point_id)
            .ok_or_else(|| FluxGridError::not_found(format!("point '{point_id}'")))?;

        let mut next = slot.clone();
        next.device = slot.device.merged(&patch);
        if let Some(label) = &patch.label {
            next.label = label.clone();
        }
        *slot = next;

        info!(point = %point_id, "device descriptor updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TopologyRegistry {
        TopologyRegistry::from_topology(TopologyConfig::demo())
    }

    #[test]
    fn device_lookup_resolves_configured_points() {
        let reg = registry();
        let device = reg.device("solar").unwrap();
        assert_eq!(device.address, 78);
        assert_eq!(device.connection, "conn-rtu");

        assert!(matches!(
            reg.device("windmill"),
            Err(FluxGridError::NotFound { .. })
        ));
    }

    #[test]
    fn connection_lookup() {
        let reg = registry();
        assert_eq!(reg.connection("conn-tcp").unwrap().unit_id, 50);
        assert!(reg.connection("conn-x").is_err());
    }

    #[test]
    fn update_merges_and_relabels() {
        let reg = registry();
        let update = DeviceUpdate {
            label: Some("Solar Array".to_string()),
            address: Some("80".to_string()),
            ..Default::default()
        };
        reg.update_device("solar", &update).unwrap();

        let point = reg.point("solar").unwrap();
        assert_eq!(point.label, "Solar Array");
        assert_eq!(point.device.address, 80);
        // untouched fields survive the merge
        assert_eq!(point.device.quantity, 10);
        assert_eq!(point.device.topic, "OutputActivePower");
    }

    #[test]
    fn malformed_update_leaves_descriptor_untouched() {
        let reg = registry();
        let before = reg.device("solar").unwrap();
        let update = DeviceUpdate {
            address: Some("99".to_string()),
            rate: Some("fast".to_string()),
            ..Default::default()
        };
        assert!(reg.update_device("solar", &update).is_err());
        assert_eq!(reg.device("solar").unwrap(), before);
    }

    #[test]
    fn update_unknown_point_is_not_found() {
        let reg = registry();
        let err = reg
            .update_device("windmill", &DeviceUpdate::default())
            .unwrap_err();
        assert!(matches!(err, FluxGridError::NotFound { .. }));
    }
}
