//! Render-ready tile geometry.
//!
//! Vertices are projected to ECEF in `f64`, then shifted so the tile's
//! centroid sits at the origin. The recentered offsets are small enough to be
//! stored as `f32` without visible precision loss.

use glam::{DVec3, Vec3};

use crate::error::{Error, Result};
use crate::geodetic::{GeodeticVertex, project};

/// Scaling applied while building a tile mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Multiplier applied to every decoded height before projection.
    pub height_scale: f64,
    /// Uniform multiplier applied after recentering (`0.001` for kilometers).
    pub output_scale: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            height_scale: 1.0,
            output_scale: 1.0,
        }
    }
}

impl BuildOptions {
    #[must_use]
    pub fn with_height_scale(mut self, height_scale: f64) -> Self {
        self.height_scale = height_scale;
        self
    }

    #[must_use]
    pub fn with_output_scale(mut self, output_scale: f64) -> Self {
        self.output_scale = output_scale;
        self
    }
}

/// A recentered, scaled triangle mesh for one terrain tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainTileMesh {
    positions: Vec<Vec3>,
    indices: Vec<u16>,
    centroid: DVec3,
    scale: f64,
}

impl TerrainTileMesh {
    /// Vertex positions relative to [`centroid`](Self::centroid), multiplied by
    /// [`scale`](Self::scale).
    ///
    /// Offsets are rounded to `f32` after recentering, so their precision
    /// follows the tile's extent: about 2 mm for a level 10 tile (offsets of
    /// tens of kilometers), but about 0.5 m for level 0 and 1 tiles, whose
    /// offsets reach the Earth's radius. Add the centroid in `f64` when more
    /// is needed.
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Triangle list indices, unchanged from the decoder.
    #[must_use]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Mean ECEF position of the projected vertices, in meters.
    #[must_use]
    pub fn centroid(&self) -> DVec3 {
        self.centroid
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Per-vertex normals averaged from adjacent faces.
    ///
    /// Face normals are weighted by triangle area and follow the input
    /// winding (counter-clockwise faces point toward the viewer). Vertices
    /// not referenced by any triangle get a zero normal.
    #[must_use]
    pub fn smooth_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(usize::from);
            let (pa, pb, pc) = (self.positions[a], self.positions[b], self.positions[c]);
            let face = (pb - pa).cross(pc - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        normals.into_iter().map(Vec3::normalize_or_zero).collect()
    }

    /// Consume the mesh, returning `(positions, indices, centroid, scale)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Vec3>, Vec<u16>, DVec3, f64) {
        (self.positions, self.indices, self.centroid, self.scale)
    }
}

/// Build a tile mesh from a flat `[lon, lat, height, ...]` vertex buffer.
///
/// # Errors
///
/// Returns [`Error::MalformedMesh`] if the vertex buffer length is not a
/// multiple of 3, or for any of the conditions listed on
/// [`build_from_vertices`].
pub fn build(raw_vertices: &[f64], indices: &[u16], options: &BuildOptions) -> Result<TerrainTileMesh> {
    let vertices = GeodeticVertex::from_flat(raw_vertices)?;
    build_from_vertices(&vertices, indices, options)
}

/// Build a tile mesh from geodetic vertices and a triangle list.
///
/// # Errors
///
/// Returns [`Error::MalformedMesh`] if there are no vertices, if the index
/// count is not a multiple of 3, or if any index is not below the vertex count.
pub fn build_from_vertices(
    vertices: &[GeodeticVertex],
    indices: &[u16],
    options: &BuildOptions,
) -> Result<TerrainTileMesh> {
    if vertices.is_empty() {
        return Err(Error::MalformedMesh {
            context: "vertices",
            detail: "tile has no vertices".to_string(),
        });
    }
    validate_indices(indices, vertices.len())?;

    let projected: Vec<DVec3> = vertices
        .iter()
        .map(|v| project(v.lon_deg, v.lat_deg, v.height_m * options.height_scale))
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let centroid = projected.iter().fold(DVec3::ZERO, |sum, &p| sum + p) / projected.len() as f64;

    let positions = projected
        .iter()
        .map(|&p| ((p - centroid) * options.output_scale).as_vec3())
        .collect();

    Ok(TerrainTileMesh {
        positions,
        indices: indices.to_vec(),
        centroid,
        scale: options.output_scale,
    })
}

fn validate_indices(indices: &[u16], vertex_count: usize) -> Result<()> {
    if !indices.len().is_multiple_of(3) {
        return Err(Error::MalformedMesh {
            context: "indices",
            detail: format!("index count {} is not divisible by 3", indices.len()),
        });
    }

    if let Some((position, &index)) = indices
        .iter()
        .enumerate()
        .find(|&(_, &index)| usize::from(index) >= vertex_count)
    {
        return Err(Error::MalformedMesh {
            context: "indices",
            detail: format!(
                "index {index} at position {position} out of range for {vertex_count} vertices"
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    /// Two triangles over a small patch near Lake Geneva, wound counter-clockwise
    /// when seen from above.
    fn patch() -> (Vec<f64>, Vec<u16>) {
        let raw = vec![
            6.50, 46.40, 372.0, //
            6.60, 46.40, 410.0, //
            6.60, 46.50, 980.0, //
            6.50, 46.50, 1250.0,
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        (raw, indices)
    }

    fn mean(positions: &[Vec3]) -> DVec3 {
        #[allow(clippy::cast_precision_loss)]
        let n = positions.len() as f64;
        positions
            .iter()
            .fold(DVec3::ZERO, |sum, p| sum + p.as_dvec3())
            / n
    }

    #[test]
    fn test_recentered_mean_is_zero_per_axis() {
        let (raw, indices) = patch();
        let mesh = build(&raw, &indices, &BuildOptions::default()).unwrap();

        let m = mean(mesh.positions());
        assert_close(m.x, 0.0, 1e-3);
        assert_close(m.y, 0.0, 1e-3);
        assert_close(m.z, 0.0, 1e-3);
    }

    #[test]
    fn test_centroid_is_mean_of_projected_vertices() {
        let (raw, indices) = patch();
        let mesh = build(&raw, &indices, &BuildOptions::default()).unwrap();

        let expected = raw
            .chunks_exact(3)
            .map(|v| project(v[0], v[1], v[2]))
            .fold(DVec3::ZERO, |sum, p| sum + p)
            / 4.0;
        assert!(mesh.centroid().distance(expected) < 1e-6);

        // Positions are offsets from the centroid on every axis.
        let first = project(raw[0], raw[1], raw[2]) - expected;
        assert!(mesh.positions()[0].as_dvec3().distance(first) < 1e-2);
    }

    #[test]
    fn test_output_scale() {
        let (raw, indices) = patch();
        let meters = build(&raw, &indices, &BuildOptions::default()).unwrap();
        let km = build(
            &raw,
            &indices,
            &BuildOptions::default().with_output_scale(0.001),
        )
        .unwrap();

        assert_eq!(km.scale(), 0.001);
        assert_eq!(km.centroid(), meters.centroid());
        for (m, k) in meters.positions().iter().zip(km.positions()) {
            assert!((*m * 0.001 - *k).length() < 1e-4);
        }
    }

    #[test]
    fn test_height_scale_exaggerates_relief() {
        let raw = [0.0, 0.0, 100.0, 0.0, 0.0, 0.0, 0.001, 0.0, 0.0];
        let indices = [0, 1, 2];
        let flat = build(&raw, &indices, &BuildOptions::default()).unwrap();
        let tall = build(
            &raw,
            &indices,
            &BuildOptions::default().with_height_scale(3.0),
        )
        .unwrap();

        let span = |mesh: &TerrainTileMesh| mesh.positions()[0].distance(mesh.positions()[1]);
        assert_close(f64::from(span(&flat)), 100.0, 1e-3);
        assert_close(f64::from(span(&tall)), 300.0, 1e-3);
    }

    #[test]
    fn test_indices_pass_through() {
        let (raw, indices) = patch();
        let mesh = build(&raw, &indices, &BuildOptions::default()).unwrap();
        assert_eq!(mesh.indices(), indices.as_slice());
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let (raw, _) = patch();
        let result = build(&raw, &[0, 1, 4], &BuildOptions::default());
        assert!(matches!(
            result,
            Err(Error::MalformedMesh {
                context: "indices",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_partial_vertex() {
        let result = build(&[0.0, 0.0], &[], &BuildOptions::default());
        assert!(matches!(
            result,
            Err(Error::MalformedMesh {
                context: "vertices",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_partial_triangle() {
        let (raw, _) = patch();
        let result = build(&raw, &[0, 1], &BuildOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_tile() {
        let result = build(&[], &[], &BuildOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_f32_offsets_error_follows_extent() {
        let max_error = |raw: &[f64]| {
            let mesh = build(raw, &[0, 1, 2], &BuildOptions::default()).unwrap();
            raw.chunks_exact(3)
                .zip(mesh.positions())
                .map(|(v, p)| {
                    let exact = project(v[0], v[1], v[2]) - mesh.centroid();
                    exact.distance(p.as_dvec3())
                })
                .fold(0.0, f64::max)
        };

        // A level 10 tile near Lake Geneva.
        let small = [6.50, 46.40, 372.0, 6.85, 46.40, 410.0, 6.85, 46.65, 980.0];
        assert!(max_error(&small[..]) < 2e-3);

        // A hemisphere-sized triangle.
        let large = [-90.0, 0.0, 0.0, 90.0, 0.0, 0.0, 0.0, 80.0, 0.0];
        let error = max_error(&large[..]);
        assert!(error < 1.0, "error {error}");
    }

    #[test]
    fn test_smooth_normals_point_up() {
        let (raw, indices) = patch();
        let mesh = build(&raw, &indices, &BuildOptions::default()).unwrap();
        let up = mesh.centroid().normalize().as_vec3();

        for normal in mesh.smooth_normals() {
            assert!((normal.length() - 1.0).abs() < 1e-5);
            assert!(normal.dot(up) > 0.9, "normal {normal} is not facing up");
        }
    }

    #[test]
    fn test_smooth_normals_unreferenced_vertex() {
        let raw = [
            0.0, 0.0, 0.0, 0.01, 0.0, 0.0, 0.0, 0.01, 0.0, 1.0, 1.0, 0.0,
        ];
        let mesh = build(&raw, &[0, 1, 2], &BuildOptions::default()).unwrap();
        assert_eq!(mesh.smooth_normals()[3], Vec3::ZERO);
    }
}
