//! Tile header unpacking.

use glam::DVec3;

use crate::cursor::{read_f32, read_f64};
use crate::error::{DecodeError, DecodeResult};

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 88;

/// The fixed-size header at the start of every tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizedMeshHeader {
    /// Tile center in ECEF meters.
    pub center: DVec3,
    /// Lowest height in the tile, meters above the ellipsoid.
    pub min_height: f32,
    /// Highest height in the tile.
    pub max_height: f32,
    /// Bounding sphere center in ECEF meters.
    pub bounding_sphere_center: DVec3,
    /// Bounding sphere radius in meters.
    pub bounding_sphere_radius: f64,
    /// Horizon occlusion point in ellipsoid-scaled coordinates.
    pub horizon_occlusion_point: DVec3,
}

/// Unpack the 88-byte header.
///
/// # Format
///
/// - Bytes 0-23: Center (3 × f64)
/// - Bytes 24-31: Minimum and maximum height (2 × f32)
/// - Bytes 32-55: Bounding sphere center (3 × f64)
/// - Bytes 56-63: Bounding sphere radius (f64)
/// - Bytes 64-87: Horizon occlusion point (3 × f64)
///
/// # Errors
///
/// Returns an error if fewer than 88 bytes remain.
pub fn unpack_header(data: &[u8], offset: &mut usize) -> DecodeResult<QuantizedMeshHeader> {
    let actual = data.len().saturating_sub(*offset);
    if actual < HEADER_SIZE {
        return Err(DecodeError::BufferTooSmall {
            expected: HEADER_SIZE,
            actual,
        });
    }

    let dvec3 = |offset: &mut usize| -> DecodeResult<DVec3> {
        Ok(DVec3::new(
            read_f64(data, offset, "header")?,
            read_f64(data, offset, "header")?,
            read_f64(data, offset, "header")?,
        ))
    };

    let center = dvec3(offset)?;
    let min_height = read_f32(data, offset, "header")?;
    let max_height = read_f32(data, offset, "header")?;
    let bounding_sphere_center = dvec3(offset)?;
    let bounding_sphere_radius = read_f64(data, offset, "header")?;
    let horizon_occlusion_point = dvec3(offset)?;

    if min_height.is_nan() || max_height.is_nan() || min_height > max_height {
        return Err(DecodeError::InvalidFormat {
            context: "header",
            detail: format!("minimum height {min_height} exceeds maximum height {max_height}"),
        });
    }

    Ok(QuantizedMeshHeader {
        center,
        min_height,
        max_height,
        bounding_sphere_center,
        bounding_sphere_radius,
        horizon_occlusion_point,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(min_height: f32, max_height: f32) -> Vec<u8> {
        let mut data = Vec::with_capacity(HEADER_SIZE);
        for v in [1.0f64, 2.0, 3.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&min_height.to_le_bytes());
        data.extend_from_slice(&max_height.to_le_bytes());
        for v in [4.0f64, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_unpack_header() {
        let data = pack(-12.5, 4810.0);
        let mut offset = 0;
        let header = unpack_header(&data, &mut offset).unwrap();

        assert_eq!(offset, HEADER_SIZE);
        assert_eq!(header.center, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(header.min_height, -12.5);
        assert_eq!(header.max_height, 4810.0);
        assert_eq!(header.bounding_sphere_center, DVec3::new(4.0, 5.0, 6.0));
        assert_eq!(header.bounding_sphere_radius, 7.0);
        assert_eq!(header.horizon_occlusion_point, DVec3::new(8.0, 9.0, 10.0));
    }

    #[test]
    fn test_header_too_small() {
        let data = pack(0.0, 1.0);
        let mut offset = 0;
        assert_eq!(
            unpack_header(&data[..40], &mut offset),
            Err(DecodeError::BufferTooSmall {
                expected: HEADER_SIZE,
                actual: 40
            })
        );
    }

    #[test]
    fn test_header_inverted_heights() {
        let data = pack(100.0, 50.0);
        let mut offset = 0;
        assert!(matches!(
            unpack_header(&data, &mut offset),
            Err(DecodeError::InvalidFormat { .. })
        ));
    }
}
