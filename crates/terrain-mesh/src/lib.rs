//! Turn decoded terrain tiles into render-ready ECEF meshes.
//!
//! This crate holds the geometry side of terrain tile streaming: mapping a
//! `level/x/y` address to the rectangle it covers, projecting geodetic
//! vertices onto the WGS84 ellipsoid, and recentering the result into a mesh
//! that can be uploaded to a GPU as-is.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no I/O, no shared state
//! - **User-controlled parallelism**: Tiles are independent; build them on
//!   whatever workers the caller likes
//! - **Decoder-agnostic**: Payload parsing sits behind [`MeshPayloadDecoder`]
//!
//! # Example
//!
//! ```
//! use terrain_mesh::{BuildOptions, TileAddress, build};
//!
//! let tile = TileAddress::new(10, 162, 373)?;
//! let bounds = tile.bounds();
//! let raw = [
//!     bounds.west, bounds.south, 0.0,
//!     bounds.east, bounds.south, 0.0,
//!     bounds.east, bounds.north, 0.0,
//! ];
//! let mesh = build(&raw, &[0, 1, 2], &BuildOptions::default().with_output_scale(0.001))?;
//! assert_eq!(mesh.triangle_count(), 1);
//! # Ok::<(), terrain_mesh::Error>(())
//! ```

pub mod address;
pub mod decode;
mod error;
pub mod geodetic;
pub mod geometry;

pub use address::{
    GeographicBounds, MAX_LATITUDE, MAX_LEVEL, TileAddress, count_tiles_in_bounds, resolve,
    tiles_in_bounds, tiles_in_bounds_up_to, tiles_per_axis,
};
pub use decode::{DecodedTile, MeshPayloadDecoder, process_tile};
pub use error::{Error, Result, TileError};
pub use geodetic::{GeodeticVertex, WGS84_E2, WGS84_SEMI_MAJOR_AXIS, WGS84_SEMI_MINOR_AXIS, project};
pub use geometry::{BuildOptions, TerrainTileMesh, build, build_from_vertices};
