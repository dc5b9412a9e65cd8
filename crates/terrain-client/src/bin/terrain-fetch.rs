use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use terrain_client::{
    Cache, Client, DEFAULT_ASSET_ID, DEFAULT_BASE_URL, DEFAULT_VERSION, DirCache, TileSource,
    build_tile,
};
use terrain_mesh::{BuildOptions, GeographicBounds, TerrainTileMesh, TileAddress};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Fetch quantized-mesh terrain tiles and build meshes")]
struct Args {
    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct SourceArgs {
    /// Terrain server base URL
    #[arg(long, env = "TERRAIN_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Terrain asset id
    #[arg(long, env = "TERRAIN_ASSET_ID", default_value = DEFAULT_ASSET_ID, global = true)]
    asset_id: String,

    /// Tileset version
    #[arg(long, env = "TERRAIN_VERSION", default_value = DEFAULT_VERSION, global = true)]
    tileset_version: String,

    /// Access token appended to tile URLs
    #[arg(long, env = "TERRAIN_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,
}

impl From<SourceArgs> for TileSource {
    fn from(args: SourceArgs) -> Self {
        Self {
            base_url: args.base_url,
            asset_id: args.asset_id,
            version: args.tileset_version,
            access_token: args.access_token,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the tiles covering a bbox on every level up to a maximum
    List {
        /// Bounding box: minLon,minLat,maxLon,maxLat
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: GeographicBounds,

        /// Deepest level to list
        #[arg(long, default_value_t = 10)]
        max_level: u8,

        /// Refuse queries covering more tiles than this
        #[arg(long, default_value_t = DEFAULT_MAX_TILES)]
        max_tiles: u64,
    },

    /// Download the tiles covering a bbox into `{out}/{level}/{x}/{y}.terrain`
    Download {
        /// Bounding box: minLon,minLat,maxLon,maxLat
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: GeographicBounds,

        /// Deepest level to download
        #[arg(long, default_value_t = 10)]
        max_level: u8,

        /// Refuse queries covering more tiles than this
        #[arg(long, default_value_t = DEFAULT_MAX_TILES)]
        max_tiles: u64,

        /// Output directory
        #[arg(long, default_value = "tiles")]
        out: PathBuf,

        /// Number of tiles fetched at once
        #[arg(long, default_value_t = 8)]
        concurrency: usize,
    },

    /// Build the mesh of a single tile
    Mesh {
        level: u8,
        x: u32,
        y: u32,

        /// Read the payload from a file instead of the network
        #[arg(long, conflicts_with = "tiles")]
        input: Option<PathBuf>,

        /// Tile directory to read from first and store fetched tiles in
        #[arg(long)]
        tiles: Option<PathBuf>,

        /// Multiplier applied to heights before projection
        #[arg(long, default_value_t = 1.0)]
        height_scale: f64,

        /// Multiplier applied to recentered positions
        #[arg(long, default_value_t = 1.0)]
        output_scale: f64,

        /// Write the mesh as Wavefront OBJ
        #[arg(long)]
        obj: Option<PathBuf>,
    },
}

const DEFAULT_MAX_TILES: u64 = 100_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let source = TileSource::from(args.source);

    match args.command {
        Command::List {
            bbox,
            max_level,
            max_tiles,
        } => list(&bbox, max_level, max_tiles)?,
        Command::Download {
            bbox,
            max_level,
            max_tiles,
            out,
            concurrency,
        } => {
            let client = Client::with_cache(DirCache::new(out)).with_source(source);
            download(&client, &bbox, max_level, max_tiles, concurrency).await?;
        }
        Command::Mesh {
            level,
            x,
            y,
            input,
            tiles,
            height_scale,
            output_scale,
            obj,
        } => {
            let tile = TileAddress::new(level, x, y)?;
            let options = BuildOptions::default()
                .with_height_scale(height_scale)
                .with_output_scale(output_scale);
            let mesh = if let Some(path) = input {
                let payload = tokio::fs::read(path).await?;
                build_tile(tile, &payload, &options)?
            } else if let Some(dir) = tiles {
                let client = Client::with_cache(DirCache::new(dir)).with_source(source);
                client.load_tile(tile, &options).await?
            } else {
                let client = Client::new().with_source(source);
                client.load_tile(tile, &options).await?
            };
            report_mesh(tile, &mesh, obj.as_deref()).await?;
        }
    }

    Ok(())
}

/// Count the tiles a query covers, refusing it above `max_tiles`.
fn checked_tile_count(
    bbox: &GeographicBounds,
    max_level: u8,
    max_tiles: u64,
) -> Result<u64, Box<dyn std::error::Error>> {
    let count = terrain_mesh::count_tiles_in_bounds(bbox, max_level)?;
    if count > max_tiles {
        return Err(format!(
            "bbox covers {count} tiles up to level {max_level}, more than --max-tiles {max_tiles}"
        )
        .into());
    }
    Ok(count)
}

fn list(
    bbox: &GeographicBounds,
    max_level: u8,
    max_tiles: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = checked_tile_count(bbox, max_level, max_tiles)?;
    for tile in terrain_mesh::tiles_in_bounds_up_to(bbox, max_level)? {
        let b = tile.bounds();
        println!(
            "{tile}\t{:.6},{:.6},{:.6},{:.6}",
            b.west,
            b.min_lat(),
            b.east,
            b.max_lat()
        );
    }
    info!(count, "listed tiles");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Saved,
    Present,
    Failed,
}

async fn download(
    client: &Client<DirCache>,
    bbox: &GeographicBounds,
    max_level: u8,
    max_tiles: u64,
    concurrency: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let total = checked_tile_count(bbox, max_level, max_tiles)?;
    info!(total, out = %client.cache().root().display(), "downloading tiles");

    let outcomes: Vec<Outcome> =
        futures_util::stream::iter(terrain_mesh::tiles_in_bounds_up_to(bbox, max_level)?)
            .map(|tile| download_tile(client, tile))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    let count = |outcome: Outcome| outcomes.iter().filter(|o| **o == outcome).count();
    info!(
        saved = count(Outcome::Saved),
        present = count(Outcome::Present),
        failed = count(Outcome::Failed),
        "download finished"
    );
    Ok(())
}

async fn download_tile(client: &Client<DirCache>, tile: TileAddress) -> Outcome {
    match client.cache().contains(tile).await {
        Ok(true) => {
            debug!(%tile, "already present");
            return Outcome::Present;
        }
        Ok(false) => {}
        Err(e) => warn!(%tile, error = %e, "cannot check tile file"),
    }

    match client.fetch_tile(tile).await {
        Ok(data) => {
            debug!(%tile, bytes = data.len(), "saved tile");
            Outcome::Saved
        }
        Err(e) => {
            warn!(%tile, error = %e, "skipping tile");
            Outcome::Failed
        }
    }
}

async fn report_mesh(
    tile: TileAddress,
    mesh: &TerrainTileMesh,
    obj: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let centroid = mesh.centroid();
    info!(
        %tile,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        centroid_x = centroid.x,
        centroid_y = centroid.y,
        centroid_z = centroid.z,
        "built mesh"
    );

    if let Some(path) = obj {
        tokio::fs::write(path, to_obj(tile, mesh)).await?;
        info!(path = %path.display(), "wrote obj");
    }
    Ok(())
}

/// Render a mesh as Wavefront OBJ with positions, normals and faces.
fn to_obj(tile: TileAddress, mesh: &TerrainTileMesh) -> String {
    let centroid = mesh.centroid();
    let mut out = String::new();
    let _ = writeln!(out, "# tile {tile}");
    let _ = writeln!(
        out,
        "# centroid {} {} {} scale {}",
        centroid.x,
        centroid.y,
        centroid.z,
        mesh.scale()
    );
    for p in mesh.positions() {
        let _ = writeln!(out, "v {} {} {}", p.x, p.y, p.z);
    }
    for n in mesh.smooth_normals() {
        let _ = writeln!(out, "vn {} {} {}", n.x, n.y, n.z);
    }
    for triangle in mesh.indices().chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| u32::from(i) + 1);
        let _ = writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}");
    }
    out
}

fn parse_bbox(bbox: &str) -> Result<GeographicBounds, String> {
    let parts: Vec<_> = bbox.split(',').collect();
    if parts.len() != 4 {
        return Err("bbox must be minLon,minLat,maxLon,maxLat".to_string());
    }

    let mut values = [0.0; 4];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .trim()
            .parse()
            .map_err(|e| format!("invalid bbox value {part:?}: {e}"))?;
    }

    let [west, south, east, north] = values;
    if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
        return Err("bbox longitudes must be within -180..=180".to_string());
    }
    if !(-90.0..=90.0).contains(&south) || !(-90.0..=90.0).contains(&north) {
        return Err("bbox latitudes must be within -90..=90".to_string());
    }
    Ok(GeographicBounds::new(west, south, east, north))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("8, 46,9,47").unwrap();
        assert_eq!(bbox, GeographicBounds::new(8.0, 46.0, 9.0, 47.0));

        assert!(parse_bbox("-123.1,43.5,-122.6,43.9").is_ok());
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("a,2,3,4").is_err());
        assert!(parse_bbox("0,-91,1,1").is_err());
        assert!(parse_bbox("NaN,0,1,1").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_tileset_version_flag() {
        let args = Args::try_parse_from([
            "terrain-fetch",
            "--tileset-version",
            "1.1.0",
            "list",
            "--bbox",
            "8,46,9,47",
        ])
        .unwrap();
        assert_eq!(TileSource::from(args.source).version, "1.1.0");

        let err = Args::try_parse_from(["terrain-fetch", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_checked_tile_count() {
        let swiss = GeographicBounds::new(8.0, 46.0, 9.0, 47.0);
        assert_eq!(checked_tile_count(&swiss, 10, 39).unwrap(), 39);
        assert!(checked_tile_count(&swiss, 10, 38).is_err());
        assert!(checked_tile_count(&swiss, 31, DEFAULT_MAX_TILES).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let args = Args::try_parse_from([
            "terrain-fetch",
            "download",
            "--bbox",
            "-1,50,0,51",
            "--max-level",
            "4",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Download {
                max_level: 4,
                concurrency: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_to_obj() {
        let tile = TileAddress::new(10, 533, 362).unwrap();
        let b = tile.bounds();
        let raw = [
            b.west, b.south, 0.0, //
            b.east, b.south, 0.0, //
            b.east, b.north, 0.0,
        ];
        let mesh = terrain_mesh::build(&raw, &[0, 1, 2], &BuildOptions::default()).unwrap();
        let obj = to_obj(tile, &mesh);

        assert!(obj.starts_with("# tile 10/533/362\n"));
        assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 3);
        assert_eq!(obj.lines().filter(|l| l.starts_with("vn ")).count(), 3);
        assert!(obj.contains("f 1//1 2//2 3//3\n"));
    }
}
