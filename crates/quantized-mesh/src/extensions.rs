//! Trailing extension records.

use crate::cursor::{read_bytes, read_u8, read_u32};
use crate::error::DecodeResult;

/// Oct-encoded per-vertex normals.
pub const EXTENSION_OCT_VERTEX_NORMALS: u8 = 1;
/// Per-tile or per-texel water mask.
pub const EXTENSION_WATER_MASK: u8 = 2;
/// JSON metadata.
pub const EXTENSION_METADATA: u8 = 4;

/// An extension record, kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub id: u8,
    pub data: Vec<u8>,
}

/// Unpack every extension record until the end of the buffer.
///
/// Each record is a `u8` id, a `u32` byte length, and that many bytes.
///
/// # Errors
///
/// Returns an error if a record header or body is truncated.
pub fn unpack_extensions(data: &[u8], offset: &mut usize) -> DecodeResult<Vec<Extension>> {
    let mut extensions = Vec::new();

    while *offset < data.len() {
        let id = read_u8(data, offset, "extension")?;
        let len = read_u32(data, offset, "extension")? as usize;
        let body = read_bytes(data, offset, len, "extension")?;
        extensions.push(Extension {
            id,
            data: body.to_vec(),
        });
    }

    Ok(extensions)
}
