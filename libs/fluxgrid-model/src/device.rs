//! Device polling descriptors
//!
//! A `DeviceDescriptor` tells the acquisition layer how a measurement
//! point's value is read from a field device: which register block, how
//! many registers, how often, and how the raw word maps to a physical
//! value. Updates arrive from the editing UI as text and go through
//! `DeviceUpdate::parse` before anything is merged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use errors::{FluxGridError, Result};

use crate::serde_defaults::{bool_true, quantity_one, rate_unit_seconds, scale_one};

/// Modbus register family a descriptor polls
///
/// Variant names are the wire values used by the Node-RED modbus nodes;
/// they must not be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegisterKind {
    InputRegister,
    HoldingRegister,
    Coil,
    DiscreteInput,
}

impl FromStr for RegisterKind {
    type Err = FluxGridError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "InputRegister" => Ok(Self::InputRegister),
            "HoldingRegister" => Ok(Self::HoldingRegister),
            "Coil" => Ok(Self::Coil),
            "DiscreteInput" => Ok(Self::DiscreteInput),
            other => Err(FluxGridError::parse("data_type", other)),
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InputRegister => "InputRegister",
            Self::HoldingRegister => "HoldingRegister",
            Self::Coil => "Coil",
            Self::DiscreteInput => "DiscreteInput",
        };
        f.write_str(s)
    }
}

/// Unit of a descriptor's poll rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollRateUnit {
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    Seconds,
    #[serde(rename = "m")]
    Minutes,
    #[serde(rename = "h")]
    Hours,
}

impl PollRateUnit {
    /// Wire representation used by the Node-RED modbus-read node
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
        }
    }
}

/// How a measurement point's value is acquired from a field device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Register family to poll
    pub kind: RegisterKind,

    /// Start register address
    pub address: u16,

    /// Number of registers per read
    #[serde(default = "quantity_one")]
    pub quantity: u16,

    /// Poll interval in `rate_unit` units
    pub rate: u32,

    /// Unit of `rate`
    #[serde(default = "rate_unit_seconds")]
    pub rate_unit: PollRateUnit,

    /// Reinterpret the raw 16-bit word as two's-complement
    #[serde(default = "bool_true")]
    pub signed: bool,

    /// Linear scale factor applied to the (possibly sign-extended) raw value
    #[serde(default = "scale_one")]
    pub scale_factor: f64,

    /// Identifier of the shared ConnectionConfig this descriptor reads through
    pub connection: String,

    /// Downstream topic label attached to the transformed value
    pub topic: String,
}

impl DeviceDescriptor {
    /// Validate descriptor invariants
    ///
    /// Address and quantity are non-negative by construction (u16); the
    /// scale factor must be non-zero or every produced value collapses
    /// to zero.
    pub fn validate(&self, point_id: &str) -> Result<()> {
        if self.scale_factor == 0.0 {
            return Err(FluxGridError::invalid_config(
                format!("points.{point_id}.device.scale_factor"),
                "scale factor must be non-zero",
            ));
        }
        if self.quantity == 0 {
            return Err(FluxGridError::invalid_config(
                format!("points.{point_id}.device.quantity"),
                "register quantity must be at least 1",
            ));
        }
        if self.rate == 0 {
            return Err(FluxGridError::invalid_config(
                format!("points.{point_id}.device.rate"),
                "poll rate must be at least 1",
            ));
        }
        Ok(())
    }

    /// Produce a copy with the patch's present fields replacing this
    /// descriptor's values
    ///
    /// Absent fields are left untouched. The caller swaps the returned
    /// value in under its own lock; the descriptor itself is never
    /// mutated in place.
    pub fn merged(&self, patch: &DevicePatch) -> DeviceDescriptor {
        let mut next = self.clone();
        if let Some(kind) = patch.kind {
            next.kind = kind;
        }
        if let Some(address) = patch.address {
            next.address = address;
        }
        if let Some(quantity) = patch.quantity {
            next.quantity = quantity;
        }
        if let Some(rate) = patch.rate {
            next.rate = rate;
        }
        if let Some(scale_factor) = patch.scale_factor {
            next.scale_factor = scale_factor;
        }
        if let Some(signed) = patch.signed {
            next.signed = signed;
        }
        if let Some(connection) = &patch.connection {
            next.connection = connection.clone();
        }
        next
    }
}

/// Descriptor update as submitted by the editing UI
///
/// Numeric-looking fields arrive as text (form inputs) and are parsed by
/// [`DeviceUpdate::parse`]. A single unparsable field rejects the whole
/// update so a partial merge can never happen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    /// New display label for the owning point
    pub label: Option<String>,
    /// Register address, decimal text
    pub address: Option<String>,
    /// Register quantity, decimal text
    pub quantity: Option<String>,
    /// Poll rate, decimal text
    pub rate: Option<String>,
    /// Scale factor, decimal text
    pub scale_factor: Option<String>,
    /// Register family name ("InputRegister", ...)
    pub data_type: Option<String>,
    /// ConnectionConfig identifier
    pub server: Option<String>,
    /// Signedness flag
    pub is_signed: Option<bool>,
}

impl DeviceUpdate {
    /// Parse the text form into a typed patch
    ///
    /// Fails with `Parse` on the first malformed field; nothing is merged
    /// on failure.
    pub fn parse(&self) -> Result<DevicePatch> {
        let address = self
            .address
            .as_deref()
            .map(|raw| parse_number::<u16>("address", raw))
            .transpose()?;
        let quantity = self
            .quantity
            .as_deref()
            .map(|raw| parse_number::<u16>("quantity", raw))
            .transpose()?;
        let rate = self
            .rate
            .as_deref()
            .map(|raw| parse_number::<u32>("rate", raw))
            .transpose()?;
        let scale_factor = self
            .scale_factor
            .as_deref()
            .map(parse_scale_factor)
            .transpose()?;
        let kind = self
            .data_type
            .as_deref()
            .map(RegisterKind::from_str)
            .transpose()?;

        Ok(DevicePatch {
            label: self.label.clone(),
            kind,
            address,
            quantity,
            rate,
            scale_factor,
            signed: self.is_signed,
            connection: self.server.clone(),
        })
    }
}

/// Typed partial descriptor produced by a successful parse
#[derive(Debug, Clone, Default)]
pub struct DevicePatch {
    pub label: Option<String>,
    pub kind: Option<RegisterKind>,
    pub address: Option<u16>,
    pub quantity: Option<u16>,
    pub rate: Option<u32>,
    pub scale_factor: Option<f64>,
    pub signed: Option<bool>,
    pub connection: Option<String>,
}

fn parse_number<T: FromStr>(field: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| FluxGridError::parse(field, raw))
}

fn parse_scale_factor(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| FluxGridError::parse("scale_factor", raw))?;
    if value == 0.0 {
        return Err(FluxGridError::invalid_config(
            "scale_factor",
            "scale factor must be non-zero",
        ));
    }
    Ok(value)
}
