//! Vertex unpacking.

use crate::cursor::{read_count, read_u16};
use crate::error::{DecodeError, DecodeResult};

/// Largest quantized coordinate; `u`, `v` and `height` all span `0..=32767`.
pub const MAX_QUANTIZED: u16 = 32767;

/// Largest vertex count addressable by the 16-bit index layout.
pub const MAX_VERTICES: usize = 65536;

/// A vertex quantized across the tile rectangle and height range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuantizedVertex {
    /// West (0) to east (32767).
    pub u: u16,
    /// South (0) to north (32767).
    pub v: u16,
    /// Minimum (0) to maximum (32767) height.
    pub height: u16,
}

impl QuantizedVertex {
    /// Normalized `(u, v, height)` in `[0, 1]`.
    #[must_use]
    pub fn normalized(&self) -> (f64, f64, f64) {
        let max = f64::from(MAX_QUANTIZED);
        (
            f64::from(self.u) / max,
            f64::from(self.v) / max,
            f64::from(self.height) / max,
        )
    }
}

/// Decode a zig-zag encoded value: `0, 1, 2, 3, ...` → `0, -1, 1, -2, ...`.
#[must_use]
pub fn zigzag_decode(value: u16) -> i32 {
    i32::from(value >> 1) ^ -i32::from(value & 1)
}

/// Unpack the vertex block.
///
/// # Format
///
/// - `u32` vertex count `n`
/// - `n × u16` u deltas, then `n × u16` v deltas, then `n × u16` height deltas
///
/// Each plane is zig-zag and delta encoded: a component is the running sum of
/// the decoded deltas before it.
///
/// # Errors
///
/// Returns an error if the buffer is truncated, the vertex count needs 32-bit
/// indices, or a decoded component leaves `0..=32767`.
pub fn unpack_vertices(data: &[u8], offset: &mut usize) -> DecodeResult<Vec<QuantizedVertex>> {
    let count = read_count(data, offset, 6, "vertices")?;
    if count > MAX_VERTICES {
        return Err(DecodeError::InvalidFormat {
            context: "vertices",
            detail: format!(
                "{count} vertices need 32-bit indices, at most {MAX_VERTICES} are supported"
            ),
        });
    }

    let u = unpack_plane(data, offset, count, "vertices.u")?;
    let v = unpack_plane(data, offset, count, "vertices.v")?;
    let height = unpack_plane(data, offset, count, "vertices.height")?;

    Ok(u.into_iter()
        .zip(v)
        .zip(height)
        .map(|((u, v), height)| QuantizedVertex { u, v, height })
        .collect())
}

fn unpack_plane(
    data: &[u8],
    offset: &mut usize,
    count: usize,
    context: &'static str,
) -> DecodeResult<Vec<u16>> {
    let mut plane = Vec::with_capacity(count);
    let mut value: i32 = 0;

    for _ in 0..count {
        value += zigzag_decode(read_u16(data, offset, context)?);
        let component = u16::try_from(value)
            .ok()
            .filter(|&c| c <= MAX_QUANTIZED)
            .ok_or_else(|| DecodeError::InvalidFormat {
                context,
                detail: format!("decoded value {value} outside 0..={MAX_QUANTIZED}"),
            })?;
        plane.push(component);
    }

    Ok(plane)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(count: u32, words: &[u16]) -> Vec<u8> {
        let mut data = count.to_le_bytes().to_vec();
        for w in words {
            data.extend_from_slice(&w.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_zigzag_decode() {
        assert_eq!(zigzag_decode(0), 0);
        assert_eq!(zigzag_decode(1), -1);
        assert_eq!(zigzag_decode(2), 1);
        assert_eq!(zigzag_decode(3), -2);
        assert_eq!(zigzag_decode(65534), 32767);
        assert_eq!(zigzag_decode(65535), -32768);
    }

    #[test]
    fn test_unpack_vertices_empty() {
        let data = pack(0, &[]);
        let mut offset = 0;
        assert!(unpack_vertices(&data, &mut offset).unwrap().is_empty());
        assert_eq!(offset, 4);
    }

    #[test]
    fn test_unpack_vertices_delta_encoding() {
        // u: 0, 32767, 100    deltas 0, +32767, -32667
        // v: 10, 5, 5         deltas +10, -5, 0
        // h: 32767, 0, 16000  deltas +32767, -32767, +16000
        let words = [
            0, 65534, 65333, //
            20, 9, 0, //
            65534, 65533, 32000,
        ];
        let data = pack(3, &words);
        let mut offset = 0;
        let vertices = unpack_vertices(&data, &mut offset).unwrap();

        assert_eq!(offset, data.len());
        assert_eq!(
            vertices,
            vec![
                QuantizedVertex {
                    u: 0,
                    v: 10,
                    height: 32767
                },
                QuantizedVertex {
                    u: 32767,
                    v: 5,
                    height: 0
                },
                QuantizedVertex {
                    u: 100,
                    v: 5,
                    height: 16000
                },
            ]
        );
    }

    #[test]
    fn test_unpack_vertices_out_of_range() {
        // A single -1 delta drives u below zero.
        let data = pack(1, &[1, 0, 0]);
        let mut offset = 0;
        assert!(matches!(
            unpack_vertices(&data, &mut offset),
            Err(DecodeError::InvalidFormat {
                context: "vertices.u",
                ..
            })
        ));
    }

    #[test]
    fn test_unpack_vertices_truncated() {
        let data = pack(2, &[0, 0, 0, 0, 0]);
        let mut offset = 0;
        assert_eq!(
            unpack_vertices(&data, &mut offset),
            Err(DecodeError::BufferTooSmall {
                expected: 12,
                actual: 10
            })
        );
    }

    #[test]
    fn test_unpack_vertices_rejects_32_bit_layout() {
        let data = pack(70_000, &[]);
        let mut data = data;
        data.resize(4 + 70_000 * 6, 0);
        let mut offset = 0;
        assert!(matches!(
            unpack_vertices(&data, &mut offset),
            Err(DecodeError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_normalized() {
        let vertex = QuantizedVertex {
            u: 0,
            v: MAX_QUANTIZED,
            height: 16384,
        };
        let (u, v, h) = vertex.normalized();
        assert_eq!(u, 0.0);
        assert_eq!(v, 1.0);
        assert!((h - 0.5).abs() < 1e-4);
    }
}
