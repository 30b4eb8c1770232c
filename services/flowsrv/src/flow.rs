//! Flow compilation and export
//!
//! Translates the topology (points + descriptors + connections) into a
//! Node-RED flow program and serializes it to the `flows.json` wire
//! format the runtime imports without modification.

pub mod compiler;
pub mod export;
pub mod program;
pub mod script;

pub use compiler::FlowCompiler;
pub use export::{serialize, ArtifactSink, FileSink};
pub use program::{CompiledFlowProgram, FlowNode};
