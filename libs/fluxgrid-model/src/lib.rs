//! Topology data model for FluxGrid
//!
//! Pure data types shared by the registry, the synchronization pipeline
//! and the flow compiler. No IO and no locking lives here; ownership of
//! mutable state is the service's concern.

pub mod connection;
pub mod device;
pub mod diagram;
pub mod point;
pub mod serde_defaults;

pub use connection::{ConnectionConfig, Parity, Transport};
pub use device::{DeviceDescriptor, DevicePatch, DeviceUpdate, PollRateUnit, RegisterKind};
pub use diagram::{DiagramEdge, DiagramNode, EdgeStyle};
pub use point::{MeasurementPoint, Position};
