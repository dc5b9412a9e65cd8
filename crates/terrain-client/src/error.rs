//! Error types for the terrain-client crate.

use std::fmt;

use quantized_mesh::DecodeError;
use terrain_mesh::{TileAddress, TileError};

/// Result type for terrain-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching and building tiles.
#[derive(Debug)]
pub enum Error {
    /// HTTP request failed.
    Http {
        /// The tile being fetched.
        tile: TileAddress,
        /// The error message.
        message: String,
    },
    /// HTTP response had a non-success status code.
    HttpStatus {
        /// The tile being fetched.
        tile: TileAddress,
        /// The HTTP status code.
        status: u16,
    },
    /// Cache operation failed.
    Cache {
        /// The operation that failed.
        operation: &'static str,
        /// The error message.
        message: String,
    },
    /// The tile payload could not be decoded.
    Decode(DecodeError),
    /// The tile address or decoded mesh was invalid.
    Mesh(terrain_mesh::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http { tile, message } => {
                write!(f, "http request for tile {tile} failed: {message}")
            }
            Error::HttpStatus { tile, status } => {
                write!(f, "http request for tile {tile} returned status {status}")
            }
            Error::Cache { operation, message } => {
                write!(f, "cache {operation} failed: {message}")
            }
            Error::Decode(e) => write!(f, "decode error: {e}"),
            Error::Mesh(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            Error::Mesh(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<terrain_mesh::Error> for Error {
    fn from(e: terrain_mesh::Error) -> Self {
        Error::Mesh(e)
    }
}

impl From<TileError<DecodeError>> for Error {
    fn from(e: TileError<DecodeError>) -> Self {
        match e {
            TileError::Decode(e) => Error::Decode(e),
            TileError::Mesh(e) => Error::Mesh(e),
        }
    }
}
