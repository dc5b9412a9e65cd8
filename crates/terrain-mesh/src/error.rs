//! Error types for tile resolution and mesh building.

use std::fmt;

/// Result type for terrain mesh operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving tiles or building meshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Tile coordinates fall outside the `2^level` grid.
    InvalidTileAddress { level: u8, x: u32, y: u32 },
    /// Decoded vertex or index arrays break the mesh invariants.
    MalformedMesh {
        context: &'static str,
        detail: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileAddress { level, x, y } => {
                write!(f, "invalid tile address {level}/{x}/{y}")
            }
            Self::MalformedMesh { context, detail } => {
                write!(f, "malformed mesh in {context}: {detail}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Error returned by [`process_tile`](crate::process_tile).
///
/// Decoder failures are passed through untouched so callers can tell a bad
/// payload apart from a structurally broken mesh.
#[derive(Debug)]
pub enum TileError<E> {
    /// The payload decoder failed.
    Decode(E),
    /// Address resolution or mesh building failed.
    Mesh(Error),
}

impl<E: fmt::Display> fmt::Display for TileError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode error: {e}"),
            Self::Mesh(e) => write!(f, "{e}"),
        }
    }
}

impl<E> std::error::Error for TileError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::Mesh(e) => Some(e),
        }
    }
}

impl<E> From<Error> for TileError<E> {
    fn from(e: Error) -> Self {
        Self::Mesh(e)
    }
}
