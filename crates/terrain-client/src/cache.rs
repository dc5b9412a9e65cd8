//! Tile payload caches.
//!
//! Payloads are keyed by tile address rather than URL, so a change of access
//! token does not invalidate cached tiles.
//!
//! - [`DirCache`]: one file per tile under `{root}/{level}/{x}/{y}.terrain`
//! - [`NoCache`]: stores nothing

use crate::error::{Error, Result};
use std::{
    future::Future,
    io,
    path::{Path, PathBuf},
    pin::Pin,
};
use terrain_mesh::TileAddress;

/// Future type for cache get operations.
pub type GetFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>>> + Send + 'a>>;

/// Future type for cache put operations.
pub type CacheFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Future type for cache contains operations.
pub type ContainsFuture<'a> = Pin<Box<dyn Future<Output = Result<bool>> + Send + 'a>>;

/// A store for raw tile payloads.
pub trait Cache: Send + Sync {
    /// Get a payload, or `Ok(None)` if the tile is not cached.
    fn get(&self, tile: TileAddress) -> GetFuture<'_>;

    /// Store a payload for later retrieval.
    fn put(&self, tile: TileAddress, data: Vec<u8>) -> CacheFuture<'_>;

    /// Check if a tile is cached without reading it.
    fn contains(&self, tile: TileAddress) -> ContainsFuture<'_>;
}

/// A cache that stores nothing (passthrough).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _tile: TileAddress) -> GetFuture<'_> {
        Box::pin(async { Ok(None) })
    }

    fn put(&self, _tile: TileAddress, _data: Vec<u8>) -> CacheFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    fn contains(&self, _tile: TileAddress) -> ContainsFuture<'_> {
        Box::pin(async { Ok(false) })
    }
}

/// A directory of tile files.
///
/// This is the layout `terrain-fetch download` writes, so a download
/// directory can be reused as a cache and a repeated download skips tiles
/// that are already present. File access is blocking; payloads are small
/// enough that this does not stall an executor noticeably.
#[derive(Debug, Clone)]
pub struct DirCache {
    root: PathBuf,
}

impl DirCache {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `tile` is stored.
    #[must_use]
    pub fn tile_path(&self, tile: TileAddress) -> PathBuf {
        self.root
            .join(tile.level().to_string())
            .join(tile.x().to_string())
            .join(format!("{}.terrain", tile.y()))
    }
}

fn io_error(operation: &'static str, path: &Path, e: &io::Error) -> Error {
    Error::Cache {
        operation,
        message: format!("{}: {e}", path.display()),
    }
}

impl Cache for DirCache {
    fn get(&self, tile: TileAddress) -> GetFuture<'_> {
        let path = self.tile_path(tile);
        Box::pin(async move {
            match std::fs::read(&path) {
                Ok(data) => Ok(Some(data)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_error("read", &path, &e)),
            }
        })
    }

    fn put(&self, tile: TileAddress, data: Vec<u8>) -> CacheFuture<'_> {
        let path = self.tile_path(tile);
        Box::pin(async move {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).map_err(|e| io_error("create", dir, &e))?;
            }

            // Readers never see a half-written tile.
            let partial = path.with_extension("terrain.part");
            std::fs::write(&partial, &data).map_err(|e| io_error("write", &partial, &e))?;
            std::fs::rename(&partial, &path).map_err(|e| io_error("rename", &path, &e))
        })
    }

    fn contains(&self, tile: TileAddress) -> ContainsFuture<'_> {
        let path = self.tile_path(tile);
        Box::pin(async move { Ok(path.is_file()) })
    }
}
