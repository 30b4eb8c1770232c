//! Transform-stage script generation
//!
//! The function node embeds a script, generated verbatim per point,
//! that converts the first polled register word into a physical value:
//! optional two's-complement reinterpretation of the 16-bit word, then
//! the descriptor's linear scale factor. `scale_register` is the same
//! policy in Rust and is what the tests pin the numbers against; the
//! script text and this function must never disagree.

use fluxgrid_model::DeviceDescriptor;

/// Raw 16-bit register word → physical value
///
/// If `signed` and bit 15 is set, the word is reinterpreted as
/// two's-complement (subtract 0x10000) before scaling.
pub fn scale_register(raw: u16, signed: bool, scale_factor: f64) -> f64 {
    let mut value = i32::from(raw);
    if signed && raw & 0x8000 != 0 {
        value -= 0x10000;
    }
    f64::from(value) * scale_factor
}

/// Generate the transform stage's script text for one descriptor
pub fn parse_function(device: &DeviceDescriptor) -> String {
    let signed_block = if device.signed {
        "\n// Reinterpret as signed 16-bit\nif (raw & 0x8000) {\n    raw = raw - 0x10000;\n}\n"
    } else {
        ""
    };

    format!(
        r#"// ---- Parse {topic} ----
let data = msg.payload;

if (!Array.isArray(data) || data.length === 0) {{
    node.error("no register data", msg);
    return null;
}}

// index 0 = register {address}
let raw = data[0];
{signed_block}
// Apply scale factor
let value = raw * {scale};

msg.topic = "{topic}";
msg.payload = value;

return msg;"#,
        topic = device.topic,
        address = device.address,
        scale = device.scale_factor,
        signed_block = signed_block,
    )
}
