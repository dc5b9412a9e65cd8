//! WGS84 geodetic to ECEF projection.

use glam::DVec3;

use crate::error::{Error, Result};

/// WGS84 semi-major axis (meters).
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
/// WGS84 semi-minor axis (meters).
pub const WGS84_SEMI_MINOR_AXIS: f64 = 6_356_752.314_2;
/// WGS84 first eccentricity squared, `1 - (b/a)^2`.
pub const WGS84_E2: f64 = 1.0
    - (WGS84_SEMI_MINOR_AXIS / WGS84_SEMI_MAJOR_AXIS)
        * (WGS84_SEMI_MINOR_AXIS / WGS84_SEMI_MAJOR_AXIS);

/// A vertex in geodetic coordinates: degrees for angles, meters for height.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeodeticVertex {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub height_m: f64,
}

impl GeodeticVertex {
    #[must_use]
    pub const fn new(lon_deg: f64, lat_deg: f64, height_m: f64) -> Self {
        Self {
            lon_deg,
            lat_deg,
            height_m,
        }
    }

    /// Split a flat `[lon, lat, height, lon, lat, height, ...]` buffer into vertices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedMesh`] if the length is not a multiple of 3.
    pub fn from_flat(raw: &[f64]) -> Result<Vec<Self>> {
        if !raw.len().is_multiple_of(3) {
            return Err(Error::MalformedMesh {
                context: "vertices",
                detail: format!("flat vertex length {} is not divisible by 3", raw.len()),
            });
        }

        Ok(raw
            .chunks_exact(3)
            .map(|v| Self::new(v[0], v[1], v[2]))
            .collect())
    }

    /// Project onto the WGS84 ellipsoid.
    #[must_use]
    pub fn to_ecef(self) -> DVec3 {
        project(self.lon_deg, self.lat_deg, self.height_m)
    }
}

/// Convert longitude, latitude (degrees) and ellipsoidal height (meters) to
/// Earth-Centered-Earth-Fixed coordinates in meters.
#[must_use]
pub fn project(lon_deg: f64, lat_deg: f64, height_m: f64) -> DVec3 {
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();

    // Prime-vertical radius of curvature.
    let n = WGS84_SEMI_MAJOR_AXIS / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    DVec3::new(
        (n + height_m) * cos_lat * cos_lon,
        (n + height_m) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + height_m) * sin_lat,
    )
}
