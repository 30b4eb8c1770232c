//! The flow compiler
//!
//! Walks the diagram's points in input order and emits, per point that
//! resolves to a device descriptor, a fully wired
//! acquisition → transform → observation stage triple, followed by one
//! connection record per distinct referenced ConnectionConfig. Stage
//! identifiers are freshly generated on every compile; connection
//! records reuse the ConnectionConfig id so acquisition stages can
//! reference them without an id-mapping pass.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use fluxgrid_model::{
    ConnectionConfig, DeviceDescriptor, DiagramEdge, MeasurementPoint, Transport,
};

use crate::flow::program::{
    CompiledFlowProgram, DebugNode, FlowNode, FunctionNode, ModbusClientNode, ModbusReadNode,
    TabNode,
};
use crate::flow::script;
use crate::registry::TopologyRegistry;

/// Horizontal placement of the acquisition column
const ACQUIRE_X: i32 = 180;
/// Transform stages sit one column to the right of acquisition
const TRANSFORM_X_OFFSET: i32 = 350;
/// Observation stages sit two columns to the right
const OBSERVE_X_OFFSET: i32 = 700;
/// First row's vertical placement
const ROW_START_Y: i32 = 40;
/// Vertical spacing between emitted points
const ROW_SPACING: i32 = 100;

/// Generate a fresh 16-hex-char flow identifier
pub fn flow_id() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

pub struct FlowCompiler {
    registry: Arc<TopologyRegistry>,
    flow_label: String,
}

impl FlowCompiler {
    pub fn new(registry: Arc<TopologyRegistry>, flow_label: impl Into<String>) -> Self {
        Self {
            registry,
            flow_label: flow_label.into(),
        }
    }

    /// Compile the diagram into a flow program
    ///
    /// Never fails: a point with no resolvable descriptor contributes
    /// nothing, and the worst case is a program holding only the tab
    /// record.
    pub fn compile(
        &self,
        points: &[MeasurementPoint],
        edges: &[DiagramEdge],
    ) -> CompiledFlowProgram {
        // Edges annotate energy flow on the diagram only; nothing of
        // them survives compilation.
        debug!(edges = edges.len(), "diagram edges are cosmetic; not compiled");

        let tab_id = flow_id();
        let mut nodes = vec![FlowNode::Tab(TabNode {
            id: tab_id.clone(),
            label: self.flow_label.clone(),
            disabled: false,
            info: String::new(),
            env: vec![],
        })];

        // Distinct referenced connection ids, first-reference order
        let mut referenced: Vec<String> = Vec::new();
        let mut y = ROW_START_Y;

        for point in points {
            let device = match self.registry.device(&point.id) {
                Ok(device) => device,
                Err(_) => {
                    warn!(point = %point.id, "no device descriptor; point skipped");
                    continue;
                }
            };

            let read_id = flow_id();
            let function_id = flow_id();
            let debug_id = flow_id();

            nodes.push(FlowNode::ModbusRead(acquisition_stage(
                read_id,
                &tab_id,
                &device,
                &function_id,
                y,
            )));
            nodes.push(FlowNode::Function(transform_stage(
                function_id,
                &tab_id,
                &device,
                &debug_id,
                y,
            )));
            nodes.push(FlowNode::Debug(observation_stage(
                debug_id, &tab_id, &device, y,
            )));

            if !referenced.contains(&device.connection) {
                referenced.push(device.connection.clone());
            }
            y += ROW_SPACING;
        }

        for connection_id in &referenced {
            match self.registry.connection(connection_id) {
                Ok(connection) => {
                    nodes.push(FlowNode::ModbusClient(connection_stage(&connection)));
                }
                Err(_) => {
                    // The acquisition stages keep the raw reference; the
                    // artifact will name a connection it does not define.
                    warn!(
                        connection = %connection_id,
                        "referenced connection missing from registry; no client record emitted"
                    );
                }
            }
        }

        CompiledFlowProgram { nodes }
    }
}

/// Acquisition stage: periodic poll of the descriptor's register block
fn acquisition_stage(
    id: String,
    tab_id: &str,
    device: &DeviceDescriptor,
    transform_id: &str,
    y: i32,
) -> ModbusReadNode {
    ModbusReadNode {
        id,
        z: tab_id.to_string(),
        name: device.topic.clone(),
        topic: String::new(),
        show_status_activities: false,
        log_io_activities: false,
        show_errors: false,
        show_warnings: true,
        unitid: String::new(),
        data_type: device.kind,
        adr: device.address.to_string(),
        quantity: device.quantity.to_string(),
        rate: device.rate.to_string(),
        rate_unit: device.rate_unit,
        delay_on_start: false,
        start_delay_time: String::new(),
        server: device.connection.clone(),
        use_io_file: false,
        io_file: String::new(),
        use_io_for_payload: false,
        empty_msg_on_fail: false,
        x: ACQUIRE_X,
        y,
        // output 0 (data) feeds the transform; output 1 (errors) open
        wires: vec![vec![transform_id.to_string()], vec![]],
    }
}

/// Transform stage: raw register word → scaled physical value
fn transform_stage(
    id: String,
    tab_id: &str,
    device: &DeviceDescriptor,
    observe_id: &str,
    y: i32,
) -> FunctionNode {
    FunctionNode {
        id,
        z: tab_id.to_string(),
        name: format!("Parse {}", device.topic),
        func: script::parse_function(device),
        outputs: 1,
        timeout: 0,
        noerr: 0,
        initialize: String::new(),
        finalize: String::new(),
        libs: vec![],
        x: ACQUIRE_X + TRANSFORM_X_OFFSET,
        y,
        wires: vec![vec![observe_id.to_string()]],
    }
}

/// Observation stage: terminal sidebar display of the scaled value
fn observation_stage(id: String, tab_id: &str, device: &DeviceDescriptor, y: i32) -> DebugNode {
    DebugNode {
        id,
        z: tab_id.to_string(),
        name: format!("{}_debug", device.topic),
        active: true,
        tosidebar: true,
        console: false,
        tostatus: false,
        complete: "payload".to_string(),
        target_type: "msg".to_string(),
        status_val: String::new(),
        status_type: "auto".to_string(),
        x: ACQUIRE_X + OBSERVE_X_OFFSET,
        y,
        wires: vec![],
    }
}

/// Connection record for one shared ConnectionConfig
///
/// Both transport field groups are always present; the inactive one
/// carries the runtime's editor defaults.
fn connection_stage(connection: &ConnectionConfig) -> ModbusClientNode {
    let (clienttype, tcp_host, tcp_port, serial_port, baud_rate, data_bits, stop_bits, parity) =
        match &connection.transport {
            Transport::Serial {
                port,
                baud_rate,
                data_bits,
                stop_bits,
                parity,
            } => (
                "simpleser",
                "127.0.0.1".to_string(),
                502,
                port.clone(),
                *baud_rate,
                *data_bits,
                *stop_bits,
                parity.as_str(),
            ),
            Transport::Tcp { host, port } => (
                "tcp",
                host.clone(),
                *port,
                "/dev/ttyUSB0".to_string(),
                9600,
                8,
                1,
                "none",
            ),
        };

    ModbusClientNode {
        id: connection.id.clone(),
        name: connection.name.clone(),
        clienttype: clienttype.to_string(),
        buffer_commands: true,
        state_log_enabled: false,
        queue_log_enabled: false,
        failure_log_enabled: true,
        tcp_host,
        tcp_port,
        tcp_type: "DEFAULT".to_string(),
        serial_port,
        serial_type: "RTU".to_string(),
        serial_baudrate: baud_rate,
        serial_databits: data_bits,
        serial_stopbits: stop_bits,
        serial_parity: parity.to_string(),
        serial_connection_delay: 100,
        serial_ascii_response_start_delimiter: "0x3A".to_string(),
        unit_id: connection.unit_id,
        command_delay: 1,
        client_timeout: connection.timeout_ms,
        reconnect_on_timeout: true,
        reconnect_timeout: connection.reconnect_ms,
        parallel_unit_ids_allowed: true,
        show_errors: false,
        show_warnings: true,
        show_logs: true,
    }
}
