/// Level loader.
///
/// ## Sources (priority order):
///   1. Map path given on the command line
///   2. `[map] path` from `config.toml`
///   3. Built-in embedded map
///
/// A file that is named but cannot be read or parsed is fatal: the game
/// never falls back to the built-in map to hide a broken level.

use std::path::{Path, PathBuf};

use crate::config::MapConfig;
use crate::domain::geom::{Rect, Vec2};
use crate::domain::grid::TileGrid;
use crate::error::LevelLoadError;

/// 15x8 tiles of 50 px: a 750x400 play field.
const BUILTIN_MAP: &str = include_str!("../../res/jumperMap.txt");

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MapSource {
    Builtin,
    File(PathBuf),
}

impl MapSource {
    /// Pick the source: command-line override, then config, then built-in.
    pub fn select(cli_path: Option<PathBuf>, config: &MapConfig) -> Self {
        cli_path
            .or_else(|| config.path.clone())
            .map_or(MapSource::Builtin, MapSource::File)
    }

    pub fn describe(&self) -> String {
        match self {
            MapSource::Builtin => "built-in map".to_string(),
            MapSource::File(p) => p.display().to_string(),
        }
    }
}

/// Build the level's grid.
pub fn load_grid(source: &MapSource, tile_size: u32) -> Result<TileGrid, LevelLoadError> {
    let grid = match source {
        MapSource::Builtin => TileGrid::parse(BUILTIN_MAP, tile_size)?,
        MapSource::File(path) => TileGrid::load(Path::new(path), tile_size)?,
    };
    tracing::info!(
        source = %source.describe(),
        width = grid.width(),
        height = grid.height(),
        tile_size,
        "level loaded"
    );
    Ok(grid)
}

/// Does a box of `size` at `point` overlap a solid tile?
///
/// Spawning inside a wall is allowed (the engine only blocks cells the box
/// moves into), but it is almost always a config mistake.
pub fn spawn_blocked(grid: &TileGrid, point: Vec2, size: Vec2) -> bool {
    let b = Rect::new(point.x, point.y, size.x, size.y);
    let columns = grid.column_span(b.x, b.right());
    grid.row_span(b.y, b.bottom())
        .any(|row| grid.row_blocked(row, columns.clone()))
}
