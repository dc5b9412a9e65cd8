//! Decode quantized-mesh terrain tiles.
//!
//! This crate parses the quantized-mesh 1.0 tile layout (16-bit index
//! variant) and maps its quantized vertices onto the tile's geographic
//! rectangle. It plugs into `terrain-mesh` through [`QuantizedMeshDecoder`].
//!
//! All functions are synchronous and allocation is limited to the output
//! buffers; the caller decides how to parallelize across tiles.

mod cursor;
mod error;
pub mod extensions;
pub mod header;
pub mod indices;
pub mod vertices;

pub use error::{DecodeError, DecodeResult};
pub use extensions::{
    EXTENSION_METADATA, EXTENSION_OCT_VERTEX_NORMALS, EXTENSION_WATER_MASK, Extension,
    unpack_extensions,
};
pub use header::{HEADER_SIZE, QuantizedMeshHeader, unpack_header};
pub use indices::{EdgeIndices, unpack_edge_indices, unpack_triangle_indices};
pub use vertices::{
    MAX_QUANTIZED, MAX_VERTICES, QuantizedVertex, unpack_vertices, zigzag_decode,
};

use terrain_mesh::{DecodedTile, GeodeticVertex, GeographicBounds, MeshPayloadDecoder};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A fully parsed quantized-mesh tile.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedMesh {
    pub header: QuantizedMeshHeader,
    pub vertices: Vec<QuantizedVertex>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u16>,
    pub edges: EdgeIndices,
    pub extensions: Vec<Extension>,
}

impl QuantizedMesh {
    /// Parse a complete, uncompressed tile payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is gzip-compressed, truncated, or
    /// structurally invalid.
    pub fn parse(data: &[u8]) -> DecodeResult<Self> {
        if data.starts_with(&GZIP_MAGIC) {
            return Err(DecodeError::InvalidFormat {
                context: "payload",
                detail: "payload is gzip-compressed; decompress it before decoding".to_string(),
            });
        }

        let mut offset = 0;
        let header = unpack_header(data, &mut offset)?;
        let vertices = unpack_vertices(data, &mut offset)?;

        // 16-bit index data starts on a 2-byte boundary.
        if !offset.is_multiple_of(2) {
            offset += 1;
        }

        let indices = unpack_triangle_indices(data, &mut offset, vertices.len())?;
        let edges = unpack_edge_indices(data, &mut offset, vertices.len())?;
        let extensions = unpack_extensions(data, &mut offset)?;

        Ok(Self {
            header,
            vertices,
            indices,
            edges,
            extensions,
        })
    }

    /// The first extension with the given id, if present.
    #[must_use]
    pub fn extension(&self, id: u8) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.id == id)
    }

    /// Map quantized vertices onto `bounds` and the header's height range.
    ///
    /// `u` runs from `bounds.west` to `bounds.east` and `v` from the southern
    /// edge to the northern one. The latitude edges are taken in order, so
    /// tile bounds whose `south` field holds the larger latitude still map
    /// `v = 0` onto the southern edge.
    #[must_use]
    pub fn to_geodetic(&self, bounds: &GeographicBounds) -> Vec<GeodeticVertex> {
        let min_height = f64::from(self.header.min_height);
        let height_range = f64::from(self.header.max_height) - min_height;
        let south = bounds.min_lat();
        let lat_range = bounds.max_lat() - south;

        self.vertices
            .iter()
            .map(|vertex| {
                let (u, v, h) = vertex.normalized();
                GeodeticVertex::new(
                    bounds.west + u * bounds.width(),
                    south + v * lat_range,
                    min_height + h * height_range,
                )
            })
            .collect()
    }
}

/// [`MeshPayloadDecoder`] for quantized-mesh payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantizedMeshDecoder;

impl MeshPayloadDecoder for QuantizedMeshDecoder {
    type Error = DecodeError;

    fn decode(&self, payload: &[u8], bounds: &GeographicBounds) -> DecodeResult<DecodedTile> {
        let mesh = QuantizedMesh::parse(payload)?;
        Ok(DecodedTile {
            vertices: mesh.to_geodetic(bounds),
            indices: mesh.indices,
        })
    }
}
