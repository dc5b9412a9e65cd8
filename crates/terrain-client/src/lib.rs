//! Async client for streaming quantized-mesh terrain tiles.
//!
//! This crate downloads terrain tiles over HTTP, caches their raw payloads,
//! and hands them to `quantized-mesh` and `terrain-mesh` to produce meshes
//! ready for rendering.
//!
//! # Design principles
//!
//! - **Runtime-agnostic**: Returns `impl Future`, works with any executor
//! - **Sync building**: Decoding and projection are synchronous; callers
//!   decide how to parallelize across tiles
//! - **Pluggable caching**: Payloads go through a [`Cache`] keyed by tile
//!
//! # Example
//!
//! ```ignore
//! use terrain_client::{Client, DirCache};
//! use terrain_mesh::{BuildOptions, TileAddress};
//!
//! let client = Client::with_cache(DirCache::new("tiles"));
//! let tile = TileAddress::containing(7.66, 45.98, 12)?;
//! let mesh = client.load_tile(tile, &BuildOptions::default()).await?;
//! println!("{} triangles", mesh.triangle_count());
//! ```

mod cache;
mod client;
mod error;
mod source;

pub use cache::{Cache, CacheFuture, ContainsFuture, DirCache, GetFuture, NoCache};
pub use client::Client;
pub use error::{Error, Result};
pub use source::{DEFAULT_ASSET_ID, DEFAULT_BASE_URL, DEFAULT_VERSION, TileSource};

use quantized_mesh::QuantizedMeshDecoder;
use terrain_mesh::{BuildOptions, TerrainTileMesh, TileAddress, process_tile};

/// Decode a quantized-mesh payload for `tile` and build its mesh.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the payload cannot be parsed, or
/// [`Error::Mesh`] if the decoded geometry is malformed.
pub fn build_tile(
    tile: TileAddress,
    payload: &[u8],
    options: &BuildOptions,
) -> Result<TerrainTileMesh> {
    tracing::trace!(%tile, bytes = payload.len(), "decoding tile");
    Ok(process_tile(&QuantizedMeshDecoder, tile, payload, options)?)
}
