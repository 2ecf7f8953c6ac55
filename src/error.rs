//! Error types for termtile.

use std::io;
use thiserror::Error;

/// termtile error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while writing to the terminal
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An element with this id is already registered
    #[error("duplicate element id: {0}")]
    DuplicateElement(String),

    /// No element with this id is registered
    #[error("unknown element id: {0}")]
    UnknownElement(String),

    /// Style intervals do not tile their row, or a merge window is out of bounds
    #[error("style tiling violated on row {row}: {reason}")]
    Tiling { row: usize, reason: String },

    /// A mouse report could not be decoded
    #[error("malformed mouse frame ({consumed} bytes consumed)")]
    MalformedFrame { consumed: usize },

    /// Configuration could not be parsed
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for termtile operations
pub type Result<T> = std::result::Result<T, Error>;
