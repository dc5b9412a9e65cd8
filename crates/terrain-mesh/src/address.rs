//! Tile addressing.
//!
//! Tiles follow the Web Mercator quad-tree: at `level` the globe is split into
//! `2^level` columns and rows, columns counted eastward from the antimeridian
//! and rows counted southward from the northern Mercator limit.

use std::f64::consts::PI;
use std::fmt;

use crate::error::{Error, Result};

/// Deepest level whose grid still fits in `u32` coordinates.
pub const MAX_LEVEL: u8 = 31;

/// Northern edge of row 0, `atan(sinh(π))` in degrees.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Keeps a query edge that sits exactly on a tile seam out of the next tile.
const EDGE_EPSILON: f64 = 1e-11;

/// A `level/x/y` tile address.
///
/// Construction validates that `x` and `y` lie inside the `2^level` grid, so
/// every `TileAddress` names a tile that exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileAddress {
    level: u8,
    x: u32,
    y: u32,
}

impl TileAddress {
    /// Create a validated tile address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTileAddress`] when `level` exceeds [`MAX_LEVEL`]
    /// or `x`/`y` is not below `2^level`.
    pub fn new(level: u8, x: u32, y: u32) -> Result<Self> {
        let n = tiles_per_axis(level).ok_or(Error::InvalidTileAddress { level, x, y })?;
        if u64::from(x) >= n || u64::from(y) >= n {
            return Err(Error::InvalidTileAddress { level, x, y });
        }
        Ok(Self { level, x, y })
    }

    /// The single level-0 tile covering the whole globe.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            level: 0,
            x: 0,
            y: 0,
        }
    }

    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Geographic rectangle covered by this tile.
    ///
    /// Longitude edges are linear in the column index. Latitude edges use the
    /// inverse spherical Mercator projection, with `south` taken from row `y`
    /// and `north` from row `y + 1`. Because rows grow southward, this leaves
    /// `south > north`; use [`GeographicBounds::min_lat`] and
    /// [`GeographicBounds::max_lat`] when an ordered pair is needed.
    #[must_use]
    pub fn bounds(&self) -> GeographicBounds {
        #[allow(clippy::cast_precision_loss)]
        let n = (1u64 << self.level) as f64;
        let x = f64::from(self.x);
        let y = f64::from(self.y);

        GeographicBounds {
            west: column_edge(x, n),
            south: row_edge(y, n),
            east: column_edge(x + 1.0, n),
            north: row_edge(y + 1.0, n),
        }
    }

    /// The tile at `level` containing the given point.
    ///
    /// Longitude is clamped to `[-180, 180]` and latitude to
    /// `±`[`MAX_LATITUDE`]; points on the far east or south edge land in the
    /// last column or row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTileAddress`] when `level` exceeds [`MAX_LEVEL`].
    pub fn containing(lon_deg: f64, lat_deg: f64, level: u8) -> Result<Self> {
        let n = tiles_per_axis(level).ok_or(Error::InvalidTileAddress {
            level,
            x: 0,
            y: 0,
        })?;
        Ok(Self {
            level,
            x: column_of(lon_deg, n),
            y: row_of(lat_deg, n),
        })
    }

    /// The tile one level up that contains this one.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        (self.level > 0).then(|| Self {
            level: self.level - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// The four tiles one level down, in row-major order.
    #[must_use]
    pub fn children(&self) -> Option<[Self; 4]> {
        if self.level >= MAX_LEVEL {
            return None;
        }
        let level = self.level + 1;
        let (x, y) = (self.x * 2, self.y * 2);
        Some([
            Self { level, x, y },
            Self { level, x: x + 1, y },
            Self { level, x, y: y + 1 },
            Self {
                level,
                x: x + 1,
                y: y + 1,
            },
        ])
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.x, self.y)
    }
}

/// A geographic rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeographicBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeographicBounds {
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Longitude span in degrees.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// The lesser of the two latitude edges.
    #[must_use]
    pub fn min_lat(&self) -> f64 {
        self.south.min(self.north)
    }

    /// The greater of the two latitude edges.
    #[must_use]
    pub fn max_lat(&self) -> f64 {
        self.south.max(self.north)
    }
}

/// Geographic bounds of the tile at `level/x/y`.
///
/// # Errors
///
/// Returns [`Error::InvalidTileAddress`] when the address is outside the grid.
pub fn resolve(level: u8, x: u32, y: u32) -> Result<GeographicBounds> {
    Ok(TileAddress::new(level, x, y)?.bounds())
}

/// Number of tiles along each axis at `level`, or `None` past [`MAX_LEVEL`].
#[must_use]
pub fn tiles_per_axis(level: u8) -> Option<u64> {
    (level <= MAX_LEVEL).then(|| 1u64 << level)
}

/// Every tile at `level` intersecting `query`.
///
/// The query's latitude edges may be given in either order. A query with
/// `west > east` is treated as crossing the antimeridian. Tiles are yielded
/// column by column, north to south within a column, without collecting
/// them first; use [`count_tiles_in_bounds`] to size a query beforehand.
///
/// # Errors
///
/// Returns [`Error::InvalidTileAddress`] when `level` exceeds [`MAX_LEVEL`].
pub fn tiles_in_bounds(
    query: &GeographicBounds,
    level: u8,
) -> Result<impl Iterator<Item = TileAddress> + use<>> {
    let coverage = Coverage::new(query, level)?;
    Ok(coverage.columns.into_iter().flat_map(move |(x_min, x_max)| {
        (x_min..=x_max).flat_map(move |x| {
            (coverage.y_min..=coverage.y_max).map(move |y| TileAddress { level, x, y })
        })
    }))
}

/// Every tile intersecting `query` on levels `0..=max_level`, coarsest first.
///
/// # Errors
///
/// Returns [`Error::InvalidTileAddress`] when `max_level` exceeds [`MAX_LEVEL`].
pub fn tiles_in_bounds_up_to(
    query: &GeographicBounds,
    max_level: u8,
) -> Result<impl Iterator<Item = TileAddress> + use<>> {
    tiles_per_axis(max_level).ok_or(Error::InvalidTileAddress {
        level: max_level,
        x: 0,
        y: 0,
    })?;
    let query = *query;
    Ok((0..=max_level).flat_map(move |level| tiles_in_bounds(&query, level).into_iter().flatten()))
}

/// Number of tiles [`tiles_in_bounds_up_to`] yields, computed without
/// enumerating them.
///
/// # Errors
///
/// Returns [`Error::InvalidTileAddress`] when `max_level` exceeds [`MAX_LEVEL`].
pub fn count_tiles_in_bounds(query: &GeographicBounds, max_level: u8) -> Result<u64> {
    let mut total = 0u64;
    for level in 0..=max_level {
        let coverage = Coverage::new(query, level)?;
        let rows = u64::from(coverage.y_max - coverage.y_min) + 1;
        for (x_min, x_max) in coverage.columns {
            total = total.saturating_add((u64::from(x_max - x_min) + 1).saturating_mul(rows));
        }
    }
    Ok(total)
}

/// Column and row ranges of a query at one level.
struct Coverage {
    columns: Vec<(u32, u32)>,
    y_min: u32,
    y_max: u32,
}

impl Coverage {
    fn new(query: &GeographicBounds, level: u8) -> Result<Self> {
        let n = tiles_per_axis(level).ok_or(Error::InvalidTileAddress {
            level,
            x: 0,
            y: 0,
        })?;

        let spans = if query.west > query.east {
            // A half that only touches the antimeridian covers nothing.
            [(query.west, 180.0), (-180.0, query.east)]
                .into_iter()
                .filter(|(west, east)| east - west > EDGE_EPSILON)
                .collect()
        } else {
            vec![(query.west, query.east)]
        };

        let columns = spans
            .into_iter()
            .map(|(west, east)| {
                (
                    column_of(west, n),
                    column_of((east - EDGE_EPSILON).max(west), n),
                )
            })
            .collect();

        let (south, north) = (query.min_lat(), query.max_lat());
        Ok(Self {
            columns,
            y_min: row_of(north, n),
            y_max: row_of((south + EDGE_EPSILON).min(north), n),
        })
    }
}

fn column_edge(column: f64, n: f64) -> f64 {
    column / n * 360.0 - 180.0
}

fn row_edge(row: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * row / n)).sinh().atan().to_degrees()
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn column_of(lon_deg: f64, n: u64) -> u32 {
    let lon = lon_deg.clamp(-180.0, 180.0);
    let column = ((lon + 180.0) / 360.0 * n as f64).floor() as u64;
    column.min(n - 1) as u32
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn row_of(lat_deg: f64, n: u64) -> u32 {
    let lat = lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let row = ((1.0 - lat.tan().asinh() / PI) / 2.0 * n as f64).floor() as u64;
    row.min(n - 1) as u32
}
