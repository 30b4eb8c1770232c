//! Value store
//!
//! The single source of truth for current measurement values. The
//! synchronization pipeline stages a whole batch against a copy and
//! commits it wholesale, so readers never observe a half-applied batch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Current value of one measurement point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointValue {
    pub value: f64,
    pub unit: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct ValueStore {
    values: RwLock<HashMap<String, PointValue>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a point's initial value at startup
    pub fn seed(&self, point_id: &str, value: f64, unit: &str) {
        self.values.write().insert(
            point_id.to_string(),
            PointValue {
                value,
                unit: unit.to_string(),
                updated_at: Utc::now(),
            },
        );
    }

    /// Current value of one point
    pub fn get(&self, point_id: &str) -> Option<PointValue> {
        self.values.read().get(point_id).cloned()
    }

    /// Copy of the full table, used to stage a batch
    pub fn snapshot(&self) -> HashMap<String, PointValue> {
        self.values.read().clone()
    }

    /// Replace the full table with a staged copy in one swap
    pub fn commit(&self, staged: HashMap<String, PointValue>) {
        *self.values.write() = staged;
    }
}
