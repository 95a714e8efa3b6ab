/// TileGrid: the level's immutable tile map.
///
/// ## Map description format
///
///   ```
///   15            <- width (tile columns)
///   8             <- height (tile rows)
///   0 0 0 0 ...   <- `height` rows of `width` codes
///   ```
///
/// `0` = Solid (walls and floors), `1` = Empty (space to move in).
/// Any deviation is a fatal load error; a partially built grid never escapes.
///
/// ## Coordinates
///
/// Cells are indexed `[row][column]`, row 0 at the top. Pixel coordinates map
/// to cells by floor division with `tile_size`. Reads outside the grid return
/// `Solid`, so the map edge behaves as a wall on every side.

use std::ops::RangeInclusive;
use std::path::Path;

use super::tile::TileKind;
use crate::error::LevelLoadError;

#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f64,
    cells: Vec<Vec<TileKind>>,
}

// ── Construction ──

impl TileGrid {
    /// Read and parse a map file.
    pub fn load(path: &Path, tile_size: u32) -> Result<Self, LevelLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LevelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, tile_size)
    }

    /// Parse a map description. See the module docs for the format.
    pub fn parse(text: &str, tile_size: u32) -> Result<Self, LevelLoadError> {
        let mut lines = text.lines().enumerate();

        let width = parse_dimension(lines.next(), 1, "width")?;
        let height = parse_dimension(lines.next(), 2, "height")?;
        if width == 0 || height == 0 {
            return Err(LevelLoadError::ZeroDimension { width, height });
        }

        let mut cells = Vec::with_capacity(height);
        for row in 0..height {
            let (_, line) = lines
                .next()
                .ok_or(LevelLoadError::MissingRow { row: row + 1 })?;
            cells.push(parse_row(line, row, width)?);
        }

        // Trailing blank lines are fine, anything else is not.
        if let Some((idx, _)) = lines.find(|(_, l)| !l.trim().is_empty()) {
            return Err(LevelLoadError::ExtraRow { line: idx + 1 });
        }

        Ok(TileGrid {
            width,
            height,
            tile_size: f64::from(tile_size.max(1)),
            cells,
        })
    }
}

fn parse_dimension(
    line: Option<(usize, &str)>,
    number: usize,
    what: &'static str,
) -> Result<usize, LevelLoadError> {
    let (_, raw) = line.ok_or(LevelLoadError::MissingHeader { line: number, what })?;
    let value = raw.trim();
    if value.is_empty() {
        return Err(LevelLoadError::MissingHeader { line: number, what });
    }
    value.parse::<usize>().map_err(|_| LevelLoadError::BadDimension {
        line: number,
        value: value.to_string(),
    })
}

fn parse_row(line: &str, row: usize, width: usize) -> Result<Vec<TileKind>, LevelLoadError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(LevelLoadError::MissingRow { row: row + 1 });
    }
    if tokens.len() != width {
        return Err(LevelLoadError::RowLength {
            row: row + 1,
            expected: width,
            found: tokens.len(),
        });
    }

    tokens
        .iter()
        .enumerate()
        .map(|(column, token)| {
            let value = token.parse::<i64>().map_err(|_| LevelLoadError::BadToken {
                row: row + 1,
                column: column + 1,
                token: token.to_string(),
            })?;
            TileKind::from_code(value).ok_or(LevelLoadError::UnknownTile {
                row: row + 1,
                column: column + 1,
                value,
            })
        })
        .collect()
}

// ── Queries ──

impl TileGrid {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    pub fn pixel_width(&self) -> f64 {
        self.width as f64 * self.tile_size
    }

    pub fn pixel_height(&self) -> f64 {
        self.height as f64 * self.tile_size
    }

    /// Tile at (row, column). Out of bounds = Solid.
    #[inline]
    pub fn tile_at(&self, row: i64, column: i64) -> TileKind {
        if row < 0 || column < 0 {
            return TileKind::Solid;
        }
        self.cells
            .get(row as usize)
            .and_then(|r| r.get(column as usize))
            .copied()
            .unwrap_or(TileKind::Solid)
    }

    #[inline]
    pub fn is_solid(&self, row: i64, column: i64) -> bool {
        self.tile_at(row, column).is_solid()
    }

    /// Column containing pixel x. Floors toward negative infinity.
    #[inline]
    pub fn column_for_x(&self, x: f64) -> i64 {
        (x / self.tile_size).floor() as i64
    }

    /// Row containing pixel y. Floors toward negative infinity.
    #[inline]
    pub fn row_for_y(&self, y: f64) -> i64 {
        (y / self.tile_size).floor() as i64
    }

    /// Columns covered by the half-open pixel interval `[left, right)`.
    ///
    /// An interval ending exactly on a tile edge does not reach into the
    /// next tile.
    #[inline]
    pub fn column_span(&self, left: f64, right: f64) -> RangeInclusive<i64> {
        self.column_for_x(left)..=self.last_cell_before(right)
    }

    /// Rows covered by the half-open pixel interval `[top, bottom)`.
    #[inline]
    pub fn row_span(&self, top: f64, bottom: f64) -> RangeInclusive<i64> {
        self.row_for_y(top)..=self.last_cell_before(bottom)
    }

    /// Last cell whose leading edge lies strictly before `end`.
    #[inline]
    fn last_cell_before(&self, end: f64) -> i64 {
        (end / self.tile_size).ceil() as i64 - 1
    }

    /// Pixel coordinate of a cell's leading edge (left or top).
    #[inline]
    pub fn edge_of(&self, cell: i64) -> f64 {
        cell as f64 * self.tile_size
    }

    /// Is any cell of `column` within `rows` solid?
    pub fn column_blocked(&self, column: i64, rows: RangeInclusive<i64>) -> bool {
        rows.into_iter().any(|row| self.is_solid(row, column))
    }

    /// Is any cell of `row` within `columns` solid?
    pub fn row_blocked(&self, row: i64, columns: RangeInclusive<i64>) -> bool {
        columns.into_iter().any(|column| self.is_solid(row, column))
    }

    /// Rows of tiles, top to bottom, for drawing.
    pub fn rows(&self) -> impl Iterator<Item = &[TileKind]> {
        self.cells.iter().map(|r| r.as_slice())
    }
}

#[cfg(test)]
impl TileGrid {
    /// Build a grid from ASCII art: `#` = Solid, anything else = Empty.
    pub fn from_ascii(rows: &[&str], tile_size: u32) -> Self {
        let cells: Vec<Vec<TileKind>> = rows
            .iter()
            .map(|r| {
                r.chars()
                    .map(|c| if c == '#' { TileKind::Solid } else { TileKind::Empty })
                    .collect()
            })
            .collect();
        TileGrid {
            width: cells.first().map_or(0, |r| r.len()),
            height: cells.len(),
            tile_size: f64::from(tile_size),
            cells,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
