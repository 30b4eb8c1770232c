//! Service configuration
//!
//! Layered the same way across all FluxGrid services: compiled-in
//! defaults, then an optional YAML file, then `FLOWSRV_*` environment
//! variables. The default topology is the four-point demo system (solar,
//! battery, load, grid tie) over one RTU bus and one TCP inverter link,
//! so the service is usable before any site configuration exists.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use errors::{FluxGridError, Result};
use fluxgrid_model::{
    ConnectionConfig, DeviceDescriptor, DiagramEdge, EdgeStyle, MeasurementPoint, Parity,
    PollRateUnit, Position, RegisterKind, Transport,
};

/// Default config file probed when no --config argument is given
pub const DEFAULT_CONFIG_PATH: &str = "config/flowsrv.yaml";

/// Top-level flowsrv configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowsrvConfig {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default = "TopologyConfig::demo")]
    pub topology: TopologyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,

    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the file sink writes artifacts into
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Default artifact filename
    #[serde(default = "default_export_filename")]
    pub filename: String,

    /// Display label of the generated flow tab
    #[serde(default = "default_flow_label")]
    pub flow_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Upper bound for one apply_batch/simulate call
    #[serde(default = "default_apply_timeout_ms")]
    pub apply_timeout_ms: u64,

    /// Upper bound of the simulator's uniform value range
    #[serde(default = "default_simulate_max")]
    pub simulate_max: f64,
}

/// The operator-composed topology: shared connections, measurement
/// points with their polling descriptors, and cosmetic flow edges
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyConfig {
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,

    #[serde(default)]
    pub points: Vec<MeasurementPoint>,

    #[serde(default)]
    pub edges: Vec<DiagramEdge>,
}

fn default_service_name() -> String {
    "flowsrv".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:6010".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> String {
    "export".to_string()
}

fn default_export_filename() -> String {
    "flows.json".to_string()
}

fn default_flow_label() -> String {
    "FluxGrid Export".to_string()
}

fn default_apply_timeout_ms() -> u64 {
    5000
}

fn default_simulate_max() -> f64 {
    100.0
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            description: Some("Flow export service".to_string()),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            filename: default_export_filename(),
            flow_label: default_flow_label(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            apply_timeout_ms: default_apply_timeout_ms(),
            simulate_max: default_simulate_max(),
        }
    }
}

impl Default for FlowsrvConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            api: ApiConfig::default(),
            log: LogConfig::default(),
            export: ExportConfig::default(),
            sync: SyncConfig::default(),
            topology: TopologyConfig::demo(),
        }
    }
}

impl FlowsrvConfig {
    /// Load configuration: defaults → optional YAML file → FLOWSRV_* env
    ///
    /// Nested keys are addressed with double underscores, e.g.
    /// `FLOWSRV_API__BIND_ADDRESS=127.0.0.1:7000`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.into());

        let config: FlowsrvConfig = Figment::from(Serialized::defaults(FlowsrvConfig::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed("FLOWSRV_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the whole configuration, topology invariants included
    pub fn validate(&self) -> Result<()> {
        let topo = &self.topology;

        let mut conn_ids = Vec::with_capacity(topo.connections.len());
        for conn in &topo.connections {
            conn.validate()?;
            if conn_ids.contains(&conn.id.as_str()) {
                return Err(FluxGridError::invalid_config(
                    format!("connections.{}", conn.id),
                    "duplicate connection id",
                ));
            }
            conn_ids.push(conn.id.as_str());
        }

        let mut point_ids = Vec::with_capacity(topo.points.len());
        for point in &topo.points {
            if point.id.is_empty() {
                return Err(FluxGridError::invalid_config(
                    "points.id",
                    "point id must not be empty",
                ));
            }
            if point_ids.contains(&point.id.as_str()) {
                return Err(FluxGridError::invalid_config(
                    format!("points.{}", point.id),
                    "duplicate point id",
                ));
            }
            point_ids.push(point.id.as_str());
            point.device.validate(&point.id)?;

            // A dangling connection reference is tolerated at compile
            // time (the acquisition stage keeps the raw id), so it is a
            // warning here, not a failure.
            if !conn_ids.contains(&point.device.connection.as_str()) {
                warn!(
                    point = %point.id,
                    connection = %point.device.connection,
                    "device descriptor references an unknown connection"
                );
            }
        }

        for edge in &topo.edges {
            if !point_ids.contains(&edge.source.as_str()) {
                return Err(FluxGridError::invalid_config(
                    format!("edges.{}.source", edge.id),
                    format!("unknown point '{}'", edge.source),
                ));
            }
            if !point_ids.contains(&edge.target.as_str()) {
                return Err(FluxGridError::invalid_config(
                    format!("edges.{}.target", edge.id),
                    format!("unknown point '{}'", edge.target),
                ));
            }
        }

        Ok(())
    }
}

impl TopologyConfig {
    /// The built-in four-point demo topology
    pub fn demo() -> Self {
        let rtu = ConnectionConfig {
            id: "conn-rtu".to_string(),
            name: "RTU".to_string(),
            transport: Transport::Serial {
                port: "/dev/ttyUSB0".to_string(),
                baud_rate: 9600,
                data_bits: 8,
                stop_bits: 1,
                parity: Parity::None,
            },
            unit_id: 1,
            timeout_ms: 1000,
            reconnect_ms: 2000,
        };
        let tcp = ConnectionConfig {
            id: "conn-tcp".to_string(),
            name: "TCP".to_string(),
            transport: Transport::Tcp {
                host: "172.28.12.11".to_string(),
                port: 502,
            },
            unit_id: 50,
            timeout_ms: 1000,
            reconnect_ms: 2000,
        };

        let points = vec![
            demo_point(
                "solar",
                "Solar",
                12.02,
                "https://cdn-icons-png.flaticon.com/512/3463/3463440.png",
                Position { x: 0.0, y: 0.0 },
                DeviceDescriptor {
                    kind: RegisterKind::InputRegister,
                    address: 78,
                    quantity: 10,
                    rate: 3,
                    rate_unit: PollRateUnit::Seconds,
                    signed: true,
                    scale_factor: 0.1,
                    connection: "conn-rtu".to_string(),
                    topic: "OutputActivePower".to_string(),
                },
            ),
            demo_point(
                "battery",
                "Battery",
                55.34,
                "https://cdn-icons-png.flaticon.com/512/1687/1687413.png",
                Position { x: 0.0, y: 250.0 },
                DeviceDescriptor {
                    kind: RegisterKind::InputRegister,
                    address: 16,
                    quantity: 10,
                    rate: 3,
                    rate_unit: PollRateUnit::Seconds,
                    signed: true,
                    scale_factor: 0.1,
                    connection: "conn-rtu".to_string(),
                    topic: "BatteryPower".to_string(),
                },
            ),
            demo_point(
                "load",
                "Load",
                23.02,
                "https://cdn-icons-png.flaticon.com/512/2801/2801682.png",
                Position { x: 300.0, y: 125.0 },
                DeviceDescriptor {
                    kind: RegisterKind::InputRegister,
                    address: 48,
                    quantity: 10,
                    rate: 3,
                    rate_unit: PollRateUnit::Seconds,
                    signed: true,
                    scale_factor: 0.1,
                    connection: "conn-rtu".to_string(),
                    topic: "LoadActivePower".to_string(),
                },
            ),
            demo_point(
                "grid",
                "Grid",
                16.12,
                "https://cdn-icons-png.flaticon.com/512/4882/4882999.png",
                Position { x: 600.0, y: 250.0 },
                DeviceDescriptor {
                    kind: RegisterKind::HoldingRegister,
                    address: 40525,
                    quantity: 2,
                    rate: 3,
                    rate_unit: PollRateUnit::Seconds,
                    signed: true,
                    scale_factor: 1.0,
                    connection: "conn-tcp".to_string(),
                    topic: "ActivePowerInv".to_string(),
                },
            ),
        ];

        let edges = vec![
            demo_edge("solar-to-load", "solar", "load", "Solar → Load", "#FFD700"),
            demo_edge(
                "battery-to-load",
                "battery",
                "load",
                "Battery → Load",
                "#9370DB",
            ),
            demo_edge("grid-to-load", "grid", "load", "Grid → Load", "#32CD32"),
        ];

        Self {
            connections: vec![rtu, tcp],
            points,
            edges,
        }
    }
}

fn demo_point(
    id: &str,
    label: &str,
    default_value: f64,
    icon: &str,
    position: Position,
    device: DeviceDescriptor,
) -> MeasurementPoint {
    MeasurementPoint {
        id: id.to_string(),
        label: label.to_string(),
        unit: "kW".to_string(),
        icon: icon.to_string(),
        position,
        default_value,
        device,
    }
}

fn demo_edge(id: &str, source: &str, target: &str, label: &str, color: &str) -> DiagramEdge {
    DiagramEdge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        style: EdgeStyle {
            label: Some(label.to_string()),
            color: Some(color.to_string()),
            animated: true,
        },
    }
}
