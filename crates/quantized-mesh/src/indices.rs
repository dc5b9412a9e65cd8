//! Index unpacking.

use crate::cursor::{read_count, read_u16};
use crate::error::{DecodeError, DecodeResult};

/// Vertices lying on each edge of the tile, used by renderers that stitch or
/// skirt neighbouring tiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeIndices {
    pub west: Vec<u16>,
    pub south: Vec<u16>,
    pub east: Vec<u16>,
    pub north: Vec<u16>,
}

/// Unpack high-water-mark encoded triangle indices.
///
/// # Format
///
/// - `u32` triangle count `t`
/// - `3t × u16` codes
///
/// Each code `c` produces index `highest - c`. A zero code introduces a new
/// vertex and advances `highest` by one, so indices first appear in order.
///
/// # Errors
///
/// Returns an error if the buffer is truncated, a code points above the
/// high-water mark, or an index is not below `vertex_count`.
pub fn unpack_triangle_indices(
    data: &[u8],
    offset: &mut usize,
    vertex_count: usize,
) -> DecodeResult<Vec<u16>> {
    let triangle_count = read_count(data, offset, 6, "indices")?;
    let len = triangle_count * 3;

    let mut indices = Vec::with_capacity(len);
    let mut highest: u32 = 0;

    for _ in 0..len {
        let code = u32::from(read_u16(data, offset, "indices")?);
        let index = highest
            .checked_sub(code)
            .ok_or_else(|| DecodeError::InvalidFormat {
                context: "indices",
                detail: format!("code {code} exceeds high-water mark {highest}"),
            })?;
        if code == 0 {
            highest += 1;
        }
        indices.push(checked_index(index as usize, vertex_count)?);
    }

    Ok(indices)
}

/// Unpack the four edge lists in west, south, east, north order.
///
/// Each list is a `u32` count followed by that many plain `u16` indices.
///
/// # Errors
///
/// Returns an error if the buffer is truncated or an index is not below
/// `vertex_count`.
pub fn unpack_edge_indices(
    data: &[u8],
    offset: &mut usize,
    vertex_count: usize,
) -> DecodeResult<EdgeIndices> {
    Ok(EdgeIndices {
        west: unpack_edge(data, offset, vertex_count)?,
        south: unpack_edge(data, offset, vertex_count)?,
        east: unpack_edge(data, offset, vertex_count)?,
        north: unpack_edge(data, offset, vertex_count)?,
    })
}

fn unpack_edge(data: &[u8], offset: &mut usize, vertex_count: usize) -> DecodeResult<Vec<u16>> {
    let count = read_count(data, offset, 2, "edge indices")?;
    (0..count)
        .map(|_| {
            let index = read_u16(data, offset, "edge indices")?;
            checked_index(usize::from(index), vertex_count)
        })
        .collect()
}

fn checked_index(index: usize, vertex_count: usize) -> DecodeResult<u16> {
    if index >= vertex_count {
        return Err(DecodeError::IndexOutOfBounds {
            index,
            len: vertex_count,
        });
    }
    // vertex_count never exceeds 65536, so any valid index fits.
    u16::try_from(index).map_err(|_| DecodeError::IndexOutOfBounds {
        index,
        len: vertex_count,
    })
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
    fn test_unpack_indices_empty() {
        let data = pack(0, &[]);
        let mut offset = 0;
        assert!(
            unpack_triangle_indices(&data, &mut offset, 0)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_unpack_indices_high_water_mark() {
        // Triangles (0,1,2) and (0,2,3).
        // highest: 0 -> code 0 -> 0, highest 1 -> code 0 -> 1, highest 2 -> code 0 -> 2,
        // highest 3 -> code 3 -> 0, code 1 -> 2, code 0 -> 3.
        let data = pack(2, &[0, 0, 0, 3, 1, 0]);
        let mut offset = 0;
        let indices = unpack_triangle_indices(&data, &mut offset, 4).unwrap();
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(offset, data.len());
    }

    #[test]
    fn test_unpack_indices_code_above_mark() {
        let data = pack(1, &[0, 5, 0]);
        let mut offset = 0;
        assert!(matches!(
            unpack_triangle_indices(&data, &mut offset, 4),
            Err(DecodeError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_unpack_indices_beyond_vertex_count() {
        let data = pack(1, &[0, 0, 0]);
        let mut offset = 0;
        assert_eq!(
            unpack_triangle_indices(&data, &mut offset, 2),
            Err(DecodeError::IndexOutOfBounds { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_unpack_edge_indices() {
        let mut data = pack(2, &[0, 3]);
        data.extend(pack(2, &[0, 1]));
        data.extend(pack(2, &[1, 2]));
        data.extend(pack(2, &[3, 2]));
        let mut offset = 0;
        let edges = unpack_edge_indices(&data, &mut offset, 4).unwrap();

        assert_eq!(edges.west, vec![0, 3]);
        assert_eq!(edges.south, vec![0, 1]);
        assert_eq!(edges.east, vec![1, 2]);
        assert_eq!(edges.north, vec![3, 2]);
        assert_eq!(offset, data.len());
    }

    #[test]
    fn test_unpack_edge_indices_truncated() {
        let data = pack(3, &[0, 1]);
        let mut offset = 0;
        assert!(matches!(
            unpack_edge_indices(&data, &mut offset, 4),
            Err(DecodeError::BufferTooSmall { .. })
        ));
    }
}
