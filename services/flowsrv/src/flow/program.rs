//! Compiled flow-program schema
//!
//! Typed mirror of the Node-RED `flows.json` records the compiler
//! emits: one `tab` container, a `modbus-read`/`function`/`debug`
//! triple per measurement point, and one `modbus-client` per referenced
//! connection. Field names and nesting are the compatibility surface
//! of the export format — renaming anything here breaks the runtime's
//! import and must be treated as a wire-format version change.

use serde::{Deserialize, Serialize};

use fluxgrid_model::{PollRateUnit, RegisterKind};

/// One record of the flow program
///
/// Serialized with the record kind in the `type` field, exactly as the
/// runtime's import expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlowNode {
    #[serde(rename = "tab")]
    Tab(TabNode),
    #[serde(rename = "modbus-read")]
    ModbusRead(ModbusReadNode),
    #[serde(rename = "function")]
    Function(FunctionNode),
    #[serde(rename = "debug")]
    Debug(DebugNode),
    #[serde(rename = "modbus-client")]
    ModbusClient(ModbusClientNode),
}

impl FlowNode {
    /// Identifier of the record, whatever its kind
    pub fn id(&self) -> &str {
        match self {
            Self::Tab(n) => &n.id,
            Self::ModbusRead(n) => &n.id,
            Self::Function(n) => &n.id,
            Self::Debug(n) => &n.id,
            Self::ModbusClient(n) => &n.id,
        }
    }

    /// Downstream adjacency of the record; container and connection
    /// records have none
    pub fn wires(&self) -> &[Vec<String>] {
        match self {
            Self::Tab(_) | Self::ModbusClient(_) => &[],
            Self::ModbusRead(n) => &n.wires,
            Self::Function(n) => &n.wires,
            Self::Debug(n) => &n.wires,
        }
    }
}

/// The flow tab every stage belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabNode {
    pub id: String,
    pub label: String,
    pub disabled: bool,
    pub info: String,
    pub env: Vec<serde_json::Value>,
}

/// Acquisition stage: periodic register poll
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModbusReadNode {
    pub id: String,
    /// Owning tab id
    pub z: String,
    pub name: String,
    pub topic: String,
    pub show_status_activities: bool,
    #[serde(rename = "logIOActivities")]
    pub log_io_activities: bool,
    pub show_errors: bool,
    pub show_warnings: bool,
    pub unitid: String,
    pub data_type: RegisterKind,
    /// Register address, decimal string per the wire format
    pub adr: String,
    pub quantity: String,
    pub rate: String,
    pub rate_unit: PollRateUnit,
    pub delay_on_start: bool,
    pub start_delay_time: String,
    /// Identifier of the owning modbus-client record
    pub server: String,
    #[serde(rename = "useIOFile")]
    pub use_io_file: bool,
    #[serde(rename = "ioFile")]
    pub io_file: String,
    #[serde(rename = "useIOForPayload")]
    pub use_io_for_payload: bool,
    pub empty_msg_on_fail: bool,
    pub x: i32,
    pub y: i32,
    /// Output 0 feeds the transform stage; output 1 (errors) stays open
    pub wires: Vec<Vec<String>>,
}

/// Transform stage: embedded script turning raw registers into a
/// physical value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionNode {
    pub id: String,
    pub z: String,
    pub name: String,
    /// Script text, generated verbatim per point
    pub func: String,
    pub outputs: u8,
    pub timeout: u32,
    pub noerr: u32,
    pub initialize: String,
    pub finalize: String,
    pub libs: Vec<serde_json::Value>,
    pub x: i32,
    pub y: i32,
    pub wires: Vec<Vec<String>>,
}

/// Observation stage: terminal sidebar display of the payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugNode {
    pub id: String,
    pub z: String,
    pub name: String,
    pub active: bool,
    pub tosidebar: bool,
    pub console: bool,
    pub tostatus: bool,
    pub complete: String,
    pub target_type: String,
    pub status_val: String,
    pub status_type: String,
    pub x: i32,
    pub y: i32,
    pub wires: Vec<Vec<String>>,
}

/// Connection record: one per distinct referenced ConnectionConfig
///
/// Carries both the serial and TCP field groups; the inactive group
/// holds the runtime's defaults, mirroring what its own editor writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModbusClientNode {
    pub id: String,
    pub name: String,
    pub clienttype: String,
    pub buffer_commands: bool,
    pub state_log_enabled: bool,
    pub queue_log_enabled: bool,
    pub failure_log_enabled: bool,
    pub tcp_host: String,
    pub tcp_port: u16,
    pub tcp_type: String,
    pub serial_port: String,
    pub serial_type: String,
    pub serial_baudrate: u32,
    pub serial_databits: u8,
    pub serial_stopbits: u8,
    pub serial_parity: String,
    pub serial_connection_delay: u32,
    pub serial_ascii_response_start_delimiter: String,
    #[serde(rename = "unit_id")]
    pub unit_id: u8,
    pub command_delay: u32,
    pub client_timeout: u64,
    pub reconnect_on_timeout: bool,
    pub reconnect_timeout: u64,
    pub parallel_unit_ids_allowed: bool,
    pub show_errors: bool,
    pub show_warnings: bool,
    pub show_logs: bool,
}

/// The full compiled artifact, serialized transparently as the flows
/// array
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompiledFlowProgram {
    pub nodes: Vec<FlowNode>,
}

impl CompiledFlowProgram {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The container record
    pub fn tab(&self) -> Option<&TabNode> {
        self.nodes.iter().find_map(|n| match n {
            FlowNode::Tab(t) => Some(t),
            _ => None,
        })
    }

    pub fn modbus_reads(&self) -> Vec<&ModbusReadNode> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                FlowNode::ModbusRead(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn functions(&self) -> Vec<&FunctionNode> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                FlowNode::Function(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn debugs(&self) -> Vec<&DebugNode> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                FlowNode::Debug(d) => Some(d),
                _ => None,
            })
            .collect()
    }

    pub fn modbus_clients(&self) -> Vec<&ModbusClientNode> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                FlowNode::ModbusClient(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Find any record by id
    pub fn find(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// True when every wire in the program points at a record that
    /// exists in the same program
    pub fn wiring_is_closed(&self) -> bool {
        self.nodes.iter().all(|node| {
            node.wires()
                .iter()
                .flatten()
                .all(|target| self.find(target).is_some())
        })
    }
}
