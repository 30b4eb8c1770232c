//! Application state
//!
//! One explicitly owned context object holding the shared registries,
//! the value store and the pipelines, passed to every API handler. Test
//! code builds the same state from an in-memory config.

use std::sync::Arc;

use crate::config::FlowsrvConfig;
use crate::flow::{ArtifactSink, FileSink, FlowCompiler};
use crate::registry::TopologyRegistry;
use crate::store::ValueStore;
use crate::sync::SyncPipeline;

pub struct AppState {
    pub config: Arc<FlowsrvConfig>,
    pub registry: Arc<TopologyRegistry>,
    pub store: Arc<ValueStore>,
    pub sync: SyncPipeline,
    pub compiler: FlowCompiler,
    pub sink: Arc<dyn ArtifactSink>,
}

impl AppState {
    /// Build the full service state from a validated configuration
    pub fn from_config(config: FlowsrvConfig) -> Self {
        let config = Arc::new(config);
        let registry = Arc::new(TopologyRegistry::from_topology(config.topology.clone()));

        let store = Arc::new(ValueStore::new());
        for point in registry.points() {
            store.seed(&point.id, point.default_value, &point.unit);
        }

        let sync = SyncPipeline::new(registry.clone(), store.clone(), &config.sync);
        let compiler = FlowCompiler::new(registry.clone(), config.export.flow_label.clone());
        let sink: Arc<dyn ArtifactSink> = Arc::new(FileSink::new(&config.export.output_dir));

        Self {
            config,
            registry,
            store,
            sync,
            compiler,
            sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_seeds_the_store_from_configured_defaults() {
        let state = AppState::from_config(FlowsrvConfig::default());
        assert_eq!(state.store.get("solar").unwrap().value, 12.02);
        assert_eq!(state.store.get("grid").unwrap().value, 16.12);
        assert_eq!(state.sync.nodes().len(), 4);
    }
}
