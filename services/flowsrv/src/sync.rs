//! Synchronization pipeline
//!
//! Applies externally observed measurement batches to the value store
//! and regenerates the diagram node projection afterwards. Exactly one
//! batch is in flight at a time: a busy flag rejects a concurrent
//! apply/simulate call instead of interleaving two regenerations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use errors::{FluxGridError, Result};
use fluxgrid_model::DiagramNode;
use parking_lot::RwLock;

use crate::config::SyncConfig;
use crate::registry::TopologyRegistry;
use crate::store::ValueStore;

/// One record of the external measurement feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    #[serde(rename = "pointId", alias = "id")]
    pub point_id: String,
    pub value: f64,
}

pub struct SyncPipeline {
    registry: Arc<TopologyRegistry>,
    store: Arc<ValueStore>,

    /// Renderer-facing projection, swapped wholesale after each batch
    nodes: RwLock<Arc<Vec<DiagramNode>>>,

    /// Single-writer guard for apply_batch/simulate
    busy: AtomicBool,

    apply_timeout: Duration,
    simulate_max: f64,
}

/// Releases the busy flag when an apply finishes, times out or panics
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncPipeline {
    pub fn new(registry: Arc<TopologyRegistry>, store: Arc<ValueStore>, config: &SyncConfig) -> Self {
        let pipeline = Self {
            registry,
            store,
            nodes: RwLock::new(Arc::new(Vec::new())),
            busy: AtomicBool::new(false),
            apply_timeout: Duration::from_millis(config.apply_timeout_ms),
            simulate_max: config.simulate_max,
        };
        pipeline.refresh_nodes();
        pipeline
    }

    /// Current node projection snapshot
    pub fn nodes(&self) -> Arc<Vec<DiagramNode>> {
        self.nodes.read().clone()
    }

    /// Apply one feed batch
    ///
    /// Entries whose point id resolves in the device registry overwrite
    /// the stored value; unknown ids are skipped and excluded from the
    /// returned count. The batch is staged against a copy and committed
    /// in one swap, then the node projection is regenerated — a timeout
    /// or panic before the commit leaves the store at last-known-good.
    pub async fn apply_batch(&self, entries: &[FeedEntry]) -> Result<usize> {
        let _guard = self.acquire()?;

        match tokio::time::timeout(self.apply_timeout, self.apply_inner(entries)).await {
            Ok(applied) => Ok(applied),
            Err(_) => Err(FluxGridError::Timeout("feed batch apply".to_string())),
        }
    }

    /// Apply a synthetic batch: one uniform-random value per point
    ///
    /// Exercises the full apply path without contacting any feed.
    pub async fn simulate(&self) -> Result<usize> {
        let batch: Vec<FeedEntry> = {
            let mut rng = rand::thread_rng();
            self.registry
                .points()
                .iter()
                .map(|point| FeedEntry {
                    point_id: point.id.clone(),
                    value: rng.gen_range(0.0..self.simulate_max),
                })
                .collect()
        };
        self.apply_batch(&batch).await
    }

    fn acquire(&self) -> Result<BusyGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(FluxGridError::Busy(
                "a feed batch is already being applied".to_string(),
            ));
        }
        Ok(BusyGuard(&self.busy))
    }

    async fn apply_inner(&self, entries: &[FeedEntry]) -> usize {
        let mut staged = self.store.snapshot();
        let now = chrono::Utc::now();
        let mut applied = 0;

        for entry in entries {
            if self.registry.device(&entry.point_id).is_err() {
                debug!(point = %entry.point_id, "skipping unknown feed id");
                continue;
            }
            // Points are seeded at startup, but a point added to the
            // registry after seeding still gets an entry here.
            let unit = self
                .registry
                .point(&entry.point_id)
                .map(|p| p.unit)
                .unwrap_or_default();
            let slot = staged
                .entry(entry.point_id.clone())
                .or_insert_with(|| crate::store::PointValue {
                    value: 0.0,
                    unit,
                    updated_at: now,
                });
            slot.value = entry.value;
            slot.updated_at = now;
            applied += 1;
        }

        self.store.commit(staged);
        self.refresh_nodes();
        debug!(applied, total = entries.len(), "feed batch applied");
        applied
    }

    /// Rebuild the full node projection from the registry and the store
    fn refresh_nodes(&self) {
        let points = self.registry.points();
        let next: Vec<DiagramNode> = points
            .iter()
            .map(|point| {
                let value = self
                    .store
                    .get(&point.id)
                    .map(|v| v.value)
                    .unwrap_or(point.default_value);
                DiagramNode {
                    id: point.id.clone(),
                    label: point.label.clone(),
                    value: point.format_value(value),
                    icon: point.icon.clone(),
                    position: point.position,
                }
            })
            .collect();
        *self.nodes.write() = Arc::new(next);
    }
}
