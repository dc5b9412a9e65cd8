//! Tile endpoint configuration.

use std::fmt;

use terrain_mesh::TileAddress;

/// Default terrain server.
pub const DEFAULT_BASE_URL: &str = "https://assets.ion.cesium.com";
/// Default terrain asset.
pub const DEFAULT_ASSET_ID: &str = "1";
/// Default tileset version.
pub const DEFAULT_VERSION: &str = "1.2.0";

/// Where tiles are fetched from.
///
/// Tile URLs follow
/// `{base_url}/{asset_id}/tiles/{level}/{x}/{y}.terrain?v={version}&access_token={token}`.
#[derive(Clone, PartialEq, Eq)]
pub struct TileSource {
    pub base_url: String,
    pub asset_id: String,
    pub version: String,
    /// Appended as `access_token` when set.
    pub access_token: Option<String>,
}

impl TileSource {
    /// URL of a single tile.
    #[must_use]
    pub fn tile_url(&self, tile: TileAddress) -> String {
        let mut url = format!(
            "{}/{}/tiles/{}/{}/{}.terrain?v={}",
            self.base_url.trim_end_matches('/'),
            self.asset_id,
            tile.level(),
            tile.x(),
            tile.y(),
            urlencoding::encode(&self.version),
        );
        if let Some(token) = &self.access_token {
            url.push_str("&access_token=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }
}

impl Default for TileSource {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            asset_id: DEFAULT_ASSET_ID.to_string(),
            version: DEFAULT_VERSION.to_string(),
            access_token: None,
        }
    }
}

// Keep tokens out of logs.
impl fmt::Debug for TileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileSource")
            .field("base_url", &self.base_url)
            .field("asset_id", &self.asset_id)
            .field("version", &self.version)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_with_token() {
        let source = TileSource {
            base_url: "https://tiles.example.com/".to_string(),
            asset_id: "42".to_string(),
            version: "1.2.0".to_string(),
            access_token: Some("abc+def".to_string()),
        };
        let tile = TileAddress::new(10, 162, 373).unwrap();
        assert_eq!(
            source.tile_url(tile),
            "https://tiles.example.com/42/tiles/10/162/373.terrain?v=1.2.0&access_token=abc%2Bdef"
        );
    }

    #[test]
    fn test_tile_url_without_token() {
        let url = TileSource::default().tile_url(TileAddress::root());
        assert_eq!(
            url,
            "https://assets.ion.cesium.com/1/tiles/0/0/0.terrain?v=1.2.0"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let source = TileSource {
            access_token: Some("secret".to_string()),
            ..TileSource::default()
        };
        let debug = format!("{source:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
