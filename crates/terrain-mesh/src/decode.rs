//! The payload decoder seam and the per-tile pipeline.

use crate::address::{GeographicBounds, TileAddress};
use crate::error::TileError;
use crate::geodetic::GeodeticVertex;
use crate::geometry::{BuildOptions, TerrainTileMesh, build_from_vertices};

/// Vertex and index arrays produced by a payload decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedTile {
    /// Geodetic vertices in decoder order.
    pub vertices: Vec<GeodeticVertex>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u16>,
}

/// Turns raw tile bytes into geodetic vertices and triangle indices.
///
/// The tile's bounds are passed in because compressed terrain formats store
/// positions quantized relative to the tile rectangle.
pub trait MeshPayloadDecoder {
    /// Error produced for payloads the decoder cannot read.
    type Error;

    /// Decode one tile payload.
    fn decode(&self, payload: &[u8], bounds: &GeographicBounds) -> Result<DecodedTile, Self::Error>;
}

/// Resolve, decode and build a single tile.
///
/// # Errors
///
/// Decoder failures come back as [`TileError::Decode`] unchanged; structural
/// problems in the decoded arrays come back as [`TileError::Mesh`].
pub fn process_tile<D>(
    decoder: &D,
    address: TileAddress,
    payload: &[u8],
    options: &BuildOptions,
) -> Result<TerrainTileMesh, TileError<D::Error>>
where
    D: MeshPayloadDecoder + ?Sized,
{
    let bounds = address.bounds();
    let decoded = decoder
        .decode(payload, &bounds)
        .map_err(TileError::Decode)?;
    Ok(build_from_vertices(
        &decoded.vertices,
        &decoded.indices,
        options,
    )?)
}
