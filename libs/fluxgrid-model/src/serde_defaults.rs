//! Serde default value functions for model structs
//!
//! Centralized here so every `#[serde(default = "...")]` attribute across
//! the model crates resolves to one consistent set of values.

use crate::device::PollRateUnit;

/// Default value: true
///
/// Used for boolean fields that should default to enabled/true.
pub fn bool_true() -> bool {
    true
}

/// Default scale factor: 1.0 (no transformation)
pub fn scale_one() -> f64 {
    1.0
}

/// Default poll rate unit: seconds
pub fn rate_unit_seconds() -> PollRateUnit {
    PollRateUnit::Seconds
}

/// Default register quantity: 1
pub fn quantity_one() -> u16 {
    1
}

/// Default unit/slave identifier: 1
pub fn unit_id_one() -> u8 {
    1
}

/// Default request timeout: 1000 ms
pub fn timeout_1000() -> u64 {
    1000
}

/// Default reconnect interval: 2000 ms
pub fn reconnect_2000() -> u64 {
    2000
}
