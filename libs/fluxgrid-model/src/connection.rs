//! Shared acquisition-transport configurations
//!
//! One `ConnectionConfig` describes one physical or network endpoint
//! (a serial RTU bus or a Modbus/TCP server). Many device descriptors
//! reference the same connection by id; the flow compiler must emit each
//! referenced connection exactly once.

use serde::{Deserialize, Serialize};

use errors::{FluxGridError, Result};

use crate::serde_defaults::{reconnect_2000, timeout_1000, unit_id_one};

/// Serial parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl Parity {
    /// Wire representation used by the Node-RED modbus-client node
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Even => "even",
            Self::Odd => "odd",
        }
    }
}

/// Transport-specific connection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transport {
    /// Serial RTU bus
    Serial {
        /// Device path, e.g. /dev/ttyUSB0
        port: String,
        baud_rate: u32,
        data_bits: u8,
        stop_bits: u8,
        parity: Parity,
    },
    /// Modbus/TCP endpoint
    Tcp { host: String, port: u16 },
}

/// A shared field-device connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Unique identifier, referenced by device descriptors
    pub id: String,

    /// Display name
    pub name: String,

    /// Transport parameters
    pub transport: Transport,

    /// Modbus unit/slave identifier
    #[serde(default = "unit_id_one")]
    pub unit_id: u8,

    /// Request timeout in milliseconds
    #[serde(default = "timeout_1000")]
    pub timeout_ms: u64,

    /// Reconnect interval after a timeout, in milliseconds
    #[serde(default = "reconnect_2000")]
    pub reconnect_ms: u64,
}

impl ConnectionConfig {
    /// Validate connection invariants
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(FluxGridError::invalid_config(
                "connections.id",
                "connection id must not be empty",
            ));
        }
        match &self.transport {
            Transport::Serial { port, baud_rate, .. } => {
                if port.is_empty() {
                    return Err(FluxGridError::invalid_config(
                        format!("connections.{}.port", self.id),
                        "serial port path must not be empty",
                    ));
                }
                if *baud_rate == 0 {
                    return Err(FluxGridError::invalid_config(
                        format!("connections.{}.baud_rate", self.id),
                        "baud rate must be non-zero",
                    ));
                }
            }
            Transport::Tcp { host, .. } => {
                if host.is_empty() {
                    return Err(FluxGridError::invalid_config(
                        format!("connections.{}.host", self.id),
                        "host must not be empty",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_connection_round_trips_yaml() {
        let yaml = r#"
id: conn-rtu
name: RTU
transport:
  kind: serial
  port: /dev/ttyUSB0
  baud_rate: 9600
  data_bits: 8
  stop_bits: 1
  parity: none
unit_id: 1
"#;
        let conn: ConnectionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(conn.id, "conn-rtu");
        assert_eq!(conn.timeout_ms, 1000);
        assert_eq!(conn.reconnect_ms, 2000);
        match &conn.transport {
            Transport::Serial { port, baud_rate, parity, .. } => {
                assert_eq!(port, "/dev/ttyUSB0");
                assert_eq!(*baud_rate, 9600);
                assert_eq!(*parity, Parity::None);
            }
            Transport::Tcp { .. } => panic!("expected serial transport"),
        }
        assert!(conn.validate().is_ok());
    }

    #[test]
    fn tcp_connection_parses() {
        let yaml = r#"
id: conn-tcp
name: TCP
transport:
  kind: tcp
  host: 172.28.12.11
  port: 502
unit_id: 50
"#;
        let conn: ConnectionConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(conn.transport, Transport::Tcp { ref host, port } if host == "172.28.12.11" && port == 502));
        assert_eq!(conn.unit_id, 50);
    }

    #[test]
    fn empty_host_fails_validation() {
        let conn = ConnectionConfig {
            id: "conn-tcp".to_string(),
            name: "TCP".to_string(),
            transport: Transport::Tcp {
                host: String::new(),
                port: 502,
            },
            unit_id: 1,
            timeout_ms: 1000,
            reconnect_ms: 2000,
        };
        assert!(conn.validate().is_err());
    }
}
