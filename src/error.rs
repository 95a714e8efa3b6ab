/// Error types.
///
/// Level loading is the only fallible step of the simulation; everything
/// after a successful load runs without errors. Terminal I/O failures come
/// from the presentation layer.

use std::io;
use std::path::PathBuf;

/// Why a map description could not be turned into a `TileGrid`.
///
/// Rows and lines are reported 1-based, the way they appear in the file.
#[derive(Debug, thiserror::Error)]
pub enum LevelLoadError {
    #[error("cannot read map file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("map header is missing line {line} ({what})")]
    MissingHeader { line: usize, what: &'static str },

    #[error("map header line {line}: '{value}' is not a tile count")]
    BadDimension { line: usize, value: String },

    #[error("map dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension { width: usize, height: usize },

    #[error("map row {row} is missing")]
    MissingRow { row: usize },

    #[error("map row {row} has {found} tiles, expected {expected}")]
    RowLength { row: usize, expected: usize, found: usize },

    #[error("map row {row}, column {column}: '{token}' is not an integer")]
    BadToken { row: usize, column: usize, token: String },

    #[error("map row {row}, column {column}: unknown tile code {value} (expected 0 or 1)")]
    UnknownTile { row: usize, column: usize, value: i64 },

    #[error("map has unexpected data after the last row (line {line})")]
    ExtraRow { line: usize },
}

/// Top-level failure of a game session.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("level load failed: {0}")]
    Level(#[from] LevelLoadError),

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}
