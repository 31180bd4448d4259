//! Sample payloads shared by the integration tests

#![allow(dead_code)]

use base64::Engine;
use serde_json::{json, Value};

/// PNG signature followed by an IHDR chunk header; enough for format sniffing.
pub const PNG_BYTES: &[u8] = &[
    0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, b'I', b'H', b'D',
    b'R', 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00,
];

/// JPEG SOI + APP0 marker.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

pub const GIF_BYTES: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00";

pub fn base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub fn png_data_url() -> String {
    format!("data:image/png;base64,{}", base64(PNG_BYTES))
}

/// Analysis payload with `count` well-formed entries and ids that do not match their position.
pub fn analysis_payload(count: usize) -> Value {
    let entries: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "id": 100 - i as i64,
                "label": format!("Look {}", i),
                "promptDescription": format!("Detailed description of look {}", i),
            })
        })
        .collect();
    Value::Array(entries)
}

/// The two-entry scenario: labels only.
pub fn bob_and_pixie() -> Value {
    json!([{ "label": "Bob" }, { "label": "Pixie" }])
}
