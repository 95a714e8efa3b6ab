/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. The world draws into a `Canvas` over the `front` buffer, in pixels
///   2. The canvas maps pixels to terminal cells (`pixels_per_column` x
///      `pixels_per_row` pixels per cell)
///   3. Compare each cell with `back` buffer (previous frame)
///   4. Only emit terminal commands for cells that changed, batched with `queue!`
///   5. Swap front/back
///
/// The bottom `TEXT_ROWS` terminal rows are reserved for status text.

use std::io::{self, BufWriter, Write};
use std::ops::Range;

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::DisplayConfig;
use crate::domain::geom::Rect;
use crate::sim::world::World;
use super::surface::{Shade, Surface};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the gap
    /// between rows matches the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

const WALL_BG: Color = Color::Rgb { r: 96, g: 96, b: 120 };
const SPACE_BG: Color = Color::Rgb { r: 10, g: 10, b: 16 };
const PLAYER_BG: Color = Color::Rgb { r: 255, g: 200, b: 40 };
const SHADOW_FG: Color = Color::Rgb { r: 120, g: 110, b: 60 };
const TEXT_FG: Color = Color::Rgb { r: 200, g: 200, b: 210 };

/// Terminal rows kept below the map for status text.
const TEXT_ROWS: usize = 2;

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if x < self.width && y < self.height {
            Some(&mut self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            match self.get_mut(x + i, y) {
                Some(cell) => *cell = Cell { ch, fg, bg: Cell::BASE_BG },
                None => break,
            }
        }
    }
}

/// Terminal cells covered by the half-open pixel range `[lo, hi)`, clipped to
/// `0..limit`.
fn cell_span(lo: f64, hi: f64, scale: u32, limit: usize) -> Range<usize> {
    let scale = f64::from(scale);
    let start = (lo / scale).floor().max(0.0);
    let end = (hi / scale).ceil().max(0.0);
    let start = (start as usize).min(limit);
    let end = (end as usize).min(limit);
    start..end.max(start)
}

// ── Canvas: pixel surface over a FrameBuffer ──

struct Canvas<'a> {
    buf: &'a mut FrameBuffer,
    px_col: u32,
    px_row: u32,
    map_rows: usize,
}

impl Surface for Canvas<'_> {
    fn size(&self) -> (u32, u32) {
        let w = (self.buf.width as u32).saturating_mul(self.px_col);
        let h = (self.map_rows as u32).saturating_mul(self.px_row);
        (w, h)
    }

    fn fill_rect(&mut self, rect: Rect, shade: Shade) {
        let cols = cell_span(rect.x, rect.right(), self.px_col, self.buf.width);
        let rows = cell_span(rect.y, rect.bottom(), self.px_row, self.map_rows);
        for y in rows {
            for x in cols.clone() {
                let Some(cell) = self.buf.get_mut(x, y) else { continue };
                match shade {
                    Shade::Wall => *cell = Cell { ch: ' ', fg: Color::White, bg: WALL_BG },
                    Shade::Space => *cell = Cell { ch: ' ', fg: Color::White, bg: SPACE_BG },
                    Shade::Player => *cell = Cell { ch: ' ', fg: Color::Black, bg: PLAYER_BG },
                    // Keep the background underneath the marker.
                    Shade::Shadow => {
                        cell.ch = '_';
                        cell.fg = SHADOW_FG;
                    }
                }
            }
        }
    }

    fn put_text(&mut self, line: usize, text: &str) {
        let y = self.map_rows + line;
        if y < self.buf.height {
            self.buf.put_str(0, y, text, TEXT_FG);
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    display: DisplayConfig,
    enhanced: bool,
}

impl Renderer {
    pub fn new(display: DisplayConfig) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            display,
            enhanced: false,
        }
    }

    /// Enter raw mode and the alternate screen. Returns whether the terminal
    /// reports key Release events.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.enhanced {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        tracing::info!(release_events = self.enhanced, "terminal initialized");

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(self.enhanced)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back differs from front in every cell.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &mut World) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        compose(&mut self.front, &self.display, world);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal's own.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

/// Draw the world into `buf`, reserving the text rows at the bottom.
fn compose(buf: &mut FrameBuffer, display: &DisplayConfig, world: &mut World) {
    let map_rows = buf.height.saturating_sub(TEXT_ROWS);
    let mut canvas = Canvas {
        buf,
        px_col: display.pixels_per_column,
        px_row: display.pixels_per_row,
        map_rows,
    };
    world.draw(&mut canvas);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::geom::Vec2;
    use crate::domain::grid::TileGrid;
    use crate::sim::engine::MovementEngine;

    fn display() -> DisplayConfig {
        DisplayConfig { pixels_per_column: 10, pixels_per_row: 20 }
    }

    #[test]
    fn cell_span_covers_partial_cells() {
        assert_eq!(cell_span(0.0, 50.0, 10, 100), 0..5);
        assert_eq!(cell_span(5.0, 26.0, 10, 100), 0..3);
        assert_eq!(cell_span(-30.0, 15.0, 10, 100), 0..2);
        assert_eq!(cell_span(90.0, 200.0, 10, 12), 9..12);
        assert_eq!(cell_span(500.0, 600.0, 10, 12), 12..12);
        assert!(cell_span(10.0, 10.0, 10, 100).is_empty());
    }

    #[test]
    fn canvas_reports_pixel_size_without_text_rows() {
        let mut buf = FrameBuffer::new(80, 24);
        let canvas = Canvas { buf: &mut buf, px_col: 10, px_row: 20, map_rows: 22 };
        assert_eq!(canvas.size(), (800, 440));
    }

    #[test]
    fn huge_display_scale_saturates() {
        let mut buf = FrameBuffer::new(200, 60);
        let canvas = Canvas { buf: &mut buf, px_col: u32::MAX / 2, px_row: u32::MAX, map_rows: 58 };
        assert_eq!(canvas.size(), (u32::MAX, u32::MAX));
    }

    #[test]
    fn fill_rect_maps_pixels_to_cells() {
        let mut buf = FrameBuffer::new(20, 10);
        let mut canvas = Canvas { buf: &mut buf, px_col: 10, px_row: 20, map_rows: 8 };
        canvas.fill_rect(Rect::new(50.0, 40.0, 50.0, 50.0), Shade::Wall);
        // Columns 5..10, rows 2..5 (90 px bottom reaches into row 4).
        assert_eq!(buf.get(5, 2).bg, WALL_BG);
        assert_eq!(buf.get(9, 4).bg, WALL_BG);
        assert_eq!(buf.get(10, 2), Cell::BLANK);
        assert_eq!(buf.get(5, 5), Cell::BLANK);
        assert_eq!(buf.get(4, 2), Cell::BLANK);
    }

    #[test]
    fn fill_rect_never_draws_into_text_rows() {
        let mut buf = FrameBuffer::new(10, 6);
        let mut canvas = Canvas { buf: &mut buf, px_col: 10, px_row: 20, map_rows: 4 };
        canvas.fill_rect(Rect::new(0.0, 0.0, 100.0, 500.0), Shade::Space);
        assert_eq!(buf.get(0, 3).bg, SPACE_BG);
        assert_eq!(buf.get(0, 4), Cell::BLANK);
    }

    #[test]
    fn shadow_keeps_background() {
        let mut buf = FrameBuffer::new(4, 4);
        let mut canvas = Canvas { buf: &mut buf, px_col: 10, px_row: 20, map_rows: 4 };
        canvas.fill_rect(Rect::new(0.0, 0.0, 40.0, 80.0), Shade::Space);
        canvas.fill_rect(Rect::new(0.0, 38.0, 20.0, 2.0), Shade::Shadow);
        let c = buf.get(1, 1);
        assert_eq!(c.ch, '_');
        assert_eq!(c.bg, SPACE_BG);
    }

    #[test]
    fn text_lands_below_map() {
        let mut buf = FrameBuffer::new(10, 6);
        let mut canvas = Canvas { buf: &mut buf, px_col: 10, px_row: 20, map_rows: 4 };
        canvas.put_text(1, "hello world");
        canvas.put_text(5, "off screen");
        assert_eq!(buf.get(0, 5).ch, 'h');
        assert_eq!(buf.get(9, 5).ch, 'l');
        assert_eq!(buf.get(0, 4), Cell::BLANK);
    }

    #[test]
    fn compose_draws_world_and_status() {
        let cfg = GameConfig::default();
        let engine = MovementEngine::new(cfg.physics.clone(), cfg.timing.dt());
        let grid = TileGrid::from_ascii(&["###", "#.#", "###"], 50);
        let mut world = World::new(grid, engine, Vec2::new(60.0, 78.0));
        let mut buf = FrameBuffer::new(15, 10);
        compose(&mut buf, &display(), &mut world);

        assert_eq!(buf.get(0, 0).bg, WALL_BG);
        // Player spans x 60..82 (cols 6..9), y 78..100 (rows 3..5).
        assert_eq!(buf.get(6, 4).bg, PLAYER_BG);
        assert_eq!(buf.get(5, 4).bg, SPACE_BG);
        assert_ne!(buf.get(1, 8).ch, ' ');
    }
}
