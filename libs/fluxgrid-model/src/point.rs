//! Measurement points
//!
//! A measurement point is a named quantity on the diagram (a power
//! source, a load, the grid tie). Its static identity and its polling
//! descriptor are fixed at configuration time; the current numeric value
//! is owned by the service's value store, never by this struct.

use serde::{Deserialize, Serialize};

use crate::device::DeviceDescriptor;

/// Diagram placement of a point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A named quantity in the energy topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementPoint {
    /// Stable identifier, e.g. "solar"
    pub id: String,

    /// Display label
    pub label: String,

    /// Engineering unit of the displayed value
    pub unit: String,

    /// Icon URL rendered by the diagram surface
    #[serde(default)]
    pub icon: String,

    /// Diagram placement
    #[serde(default)]
    pub position: Position,

    /// Value seeded into the store before the first feed arrives
    #[serde(default)]
    pub default_value: f64,

    /// How this point's value is acquired
    pub device: DeviceDescriptor,
}

impl MeasurementPoint {
    /// Render a value the way the diagram displays it, e.g. "12.02 kW"
    pub fn format_value(&self, value: f64) -> String {
        format!("{:.2} {}", value, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{PollRateUnit, RegisterKind};

    #[test]
    fn value_formatting() {
        let point = MeasurementPoint {
            id: "solar".to_string(),
            label: "Solar".to_string(),
            unit: "kW".to_string(),
            icon: String::new(),
            position: Position { x: 0.0, y: 0.0 },
            default_value: 12.02,
            device: DeviceDescriptor {
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
        };
        assert_eq!(point.format_value(12.0214), "12.02 kW");
        assert_eq!(point.format_value(-3276.8), "-3276.80 kW");
    }
}
