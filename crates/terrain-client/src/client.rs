//! HTTP client for fetching terrain tiles.

use crate::cache::{Cache, NoCache};
use crate::error::{Error, Result};
use crate::source::TileSource;
use std::sync::Arc;
use terrain_mesh::{BuildOptions, TerrainTileMesh, TileAddress};

/// Media types accepted from the tile server, most preferred first.
const ACCEPT: &str = "application/vnd.quantized-mesh,application/octet-stream;q=0.9";

/// HTTP client for fetching quantized-mesh terrain tiles.
///
/// The client handles HTTP requests and caching, and can turn a fetched tile
/// straight into a [`TerrainTileMesh`]. It is runtime-agnostic and works with
/// any async executor.
///
/// # Example
///
/// ```ignore
/// let client = Client::new();
/// let tile = TileAddress::new(10, 533, 362)?;
/// let mesh = client.load_tile(tile, &BuildOptions::default()).await?;
/// ```
pub struct Client<C: Cache = NoCache> {
    http: reqwest::Client,
    cache: Arc<C>,
    source: TileSource,
}

impl Client<NoCache> {
    /// Create a new client with the default tile source and no caching.
    #[must_use]
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            cache: Arc::new(NoCache),
            source: TileSource::default(),
        }
    }
}

impl Default for Client<NoCache> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Cache> Client<C> {
    /// Create a new client with a custom cache.
    #[must_use]
    pub fn with_cache(cache: C) -> Self {
        Self {
            http: reqwest::Client::new(),
            cache: Arc::new(cache),
            source: TileSource::default(),
        }
    }

    /// Create a new client with a custom HTTP client and cache.
    #[must_use]
    pub fn with_http_and_cache(http: reqwest::Client, cache: C) -> Self {
        Self {
            http,
            cache: Arc::new(cache),
            source: TileSource::default(),
        }
    }

    /// Fetch tiles from a different server, asset, or with an access token.
    #[must_use]
    pub fn with_source(mut self, source: TileSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn source(&self) -> &TileSource {
        &self.source
    }

    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Fetch the raw payload of a tile, using the cache if available.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP request fails, the server answers with a
    /// non-success status, or the cache fails.
    pub async fn fetch_tile(&self, tile: TileAddress) -> Result<Vec<u8>> {
        if let Some(data) = self.cache.get(tile).await? {
            tracing::debug!(%tile, "cache hit");
            return Ok(data);
        }

        tracing::debug!(%tile, "fetching");

        let response = self
            .http
            .get(self.source.tile_url(tile))
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send()
            .await
            .map_err(|e| Error::Http {
                tile,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                tile,
                status: status.as_u16(),
            });
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::Http {
                tile,
                message: e.to_string(),
            })?
            .to_vec();

        self.cache.put(tile, data.clone()).await?;

        Ok(data)
    }

    /// Fetch a tile and build its render-ready mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if fetching fails, the payload cannot be decoded, or
    /// the decoded mesh is malformed.
    pub async fn load_tile(
        &self,
        tile: TileAddress,
        options: &BuildOptions,
    ) -> Result<TerrainTileMesh> {
        let payload = self.fetch_tile(tile).await?;
        let mesh = crate::build_tile(tile, &payload, options)?;

        tracing::debug!(
            %tile,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "built tile mesh"
        );

        Ok(mesh)
    }
}
