//! Compile → serialize → re-parse round-trip tests
//!
//! The serialized artifact is the compatibility surface with the
//! external runtime, so these tests pin the wire schema itself: exact
//! field-name sets per record kind, stage counts, and adjacency.

use std::collections::BTreeSet;
use std::sync::Arc;

use flowsrv::config::TopologyConfig;
use flowsrv::flow::{serialize, CompiledFlowProgram, FlowCompiler, FlowNode};
use flowsrv::registry::TopologyRegistry;

fn compile_demo() -> CompiledFlowProgram {
    let registry = Arc::new(TopologyRegistry::from_topology(TopologyConfig::demo()));
    let points = registry.points();
    FlowCompiler::new(registry, "FluxGrid Export").compile(&points, &[])
}

fn keys_of(value: &serde_json::Value) -> BTreeSet<String> {
    value
        .as_object()
        .expect("record must be a JSON object")
        .keys()
        .cloned()
        .collect()
}

#[test]
fn round_trip_preserves_structure() {
    let program = compile_demo();
    let bytes = serialize(&program).unwrap();
    let reparsed: CompiledFlowProgram = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(reparsed.len(), program.len());
    assert_eq!(reparsed.modbus_reads().len(), program.modbus_reads().len());
    assert_eq!(reparsed.functions().len(), program.functions().len());
    assert_eq!(reparsed.debugs().len(), program.debugs().len());
    assert_eq!(
        reparsed.modbus_clients().len(),
        program.modbus_clients().len()
    );

    // adjacency survives byte-for-byte
    for (original, round_tripped) in program.nodes.iter().zip(&reparsed.nodes) {
        assert_eq!(original.id(), round_tripped.id());
        assert_eq!(original.wires(), round_tripped.wires());
    }
    assert!(reparsed.wiring_is_closed());
}

#[test]
fn modbus_read_record_has_the_exact_wire_fields() {
    let program = compile_demo();
    let value = serde_json::to_value(&program).unwrap();
    let read = value
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["type"] == "modbus-read")
        .unwrap();

    let expected: BTreeSet<String> = [
        "id",
        "type",
        "z",
        "name",
        "topic",
        "showStatusActivities",
        "logIOActivities",
        "showErrors",
        "showWarnings",
        "unitid",
        "dataType",
        "adr",
        "quantity",
        "rate",
        "rateUnit",
        "delayOnStart",
        "startDelayTime",
        "server",
        "useIOFile",
        "ioFile",
        "useIOForPayload",
        "emptyMsgOnFail",
        "x",
        "y",
        "wires",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    assert_eq!(keys_of(read), expected);
    // numeric acquisition parameters travel as decimal strings
    assert!(read["adr"].is_string());
    assert!(read["quantity"].is_string());
    assert!(read["rate"].is_string());
}

#[test]
fn modbus_client_record_has_the_exact_wire_fields() {
    let program = compile_demo();
    let value = serde_json::to_value(&program).unwrap();
    let client = value
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["type"] == "modbus-client")
        .unwrap();

    let expected: BTreeSet<String> = [
        "id",
        "type",
        "name",
        "clienttype",
        "bufferCommands",
        "stateLogEnabled",
        "queueLogEnabled",
        "failureLogEnabled",
        "tcpHost",
        "tcpPort",
        "tcpType",
        "serialPort",
        "serialType",
        "serialBaudrate",
        "serialDatabits",
        "serialStopbits",
        "serialParity",
        "serialConnectionDelay",
        "serialAsciiResponseStartDelimiter",
        "unit_id",
        "commandDelay",
        "clientTimeout",
        "reconnectOnTimeout",
        "reconnectTimeout",
        "parallelUnitIdsAllowed",
        "showErrors",
        "showWarnings",
        "showLogs",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    assert_eq!(keys_of(client), expected);
}

#[test]
fn function_and_debug_records_match_the_wire_schema() {
    let program = compile_demo();
    let value = serde_json::to_value(&program).unwrap();
    let array = value.as_array().unwrap();

    let function = array.iter().find(|n| n["type"] == "function").unwrap();
    for key in ["func", "outputs", "noerr", "initialize", "finalize", "libs"] {
        assert!(function.get(key).is_some(), "function record missing {key}");
    }
    assert_eq!(function["outputs"], 1);

    let debug = array.iter().find(|n| n["type"] == "debug").unwrap();
    assert_eq!(debug["tosidebar"], true);
    assert_eq!(debug["complete"], "payload");
    assert_eq!(debug["targetType"], "msg");
    assert_eq!(debug["wires"], serde_json::json!([]));
}

#[test]
fn every_stage_belongs_to_the_tab() {
    let program = compile_demo();
    let tab_id = program.tab().unwrap().id.clone();
    for node in &program.nodes {
        match node {
            FlowNode::ModbusRead(n) => assert_eq!(n.z, tab_id),
            FlowNode::Function(n) => assert_eq!(n.z, tab_id),
            FlowNode::Debug(n) => assert_eq!(n.z, tab_id),
            FlowNode::Tab(_) | FlowNode::ModbusClient(_) => {}
        }
    }
}

#[test]
fn solar_scenario_end_to_end() {
    let registry = Arc::new(TopologyRegistry::from_topology(TopologyConfig::demo()));
    let solar = registry.point("solar").unwrap();
    let program =
        FlowCompiler::new(registry, "FluxGrid Export").compile(std::slice::from_ref(&solar), &[]);

    // tab + acquisition + transform + observation + one connection
    assert_eq!(program.len(), 5);

    let read = program.modbus_reads()[0];
    let function = program.functions()[0];
    let debug = program.debugs()[0];

    assert_eq!(read.wires[0], vec![function.id.clone()]);
    assert_eq!(function.wires[0], vec![debug.id.clone()]);
    assert!(debug.wires.is_empty());

    let clients = program.modbus_clients();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].id, "conn-rtu");
}
