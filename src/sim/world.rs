/// World: the running game session.
///
/// Owns the level's `TileGrid`, the `PlayerState`, the `MovementEngine` and
/// the camera. The loop driver calls `tick()` then `draw()` once per tick.
///
/// ## Camera / Viewport
///
/// World coordinates and screen coordinates are separate:
///   - `camera`: viewport into the world (top-left pixel + size)
///   - Drawing maps: `screen(sx, sy) = world(sx + camera.x, sy + camera.y)`
///   - Camera follows the player with a dead-zone approach
///   - Maps smaller than the viewport are centered
///
/// The grid never stores the camera; it is handed to drawing as a value.

use crate::domain::geom::{Rect, Vec2};
use crate::domain::grid::TileGrid;
use crate::domain::player::PlayerState;
use crate::domain::tile::TileKind;
use crate::ui::surface::{Shade, Surface};
use super::engine::{self, MovementEngine};
use super::event::MoveEvent;

/// Camera: a viewport into the world, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Camera {
    /// World x of the top-left visible pixel (negative when centering)
    pub x: f64,
    /// World y of the top-left visible pixel
    pub y: f64,
    pub view_w: f64,
    pub view_h: f64,
}

impl Camera {
    /// Update camera to follow a target within the given world bounds.
    /// Only scrolls when the target nears the viewport edge.
    pub fn follow(&mut self, target: Rect, world_w: f64, world_h: f64) {
        if self.view_w <= 0.0 || self.view_h <= 0.0 { return; }
        self.x = follow_axis(self.x, self.view_w, target.x, target.right(), world_w);
        self.y = follow_axis(self.y, self.view_h, target.y, target.bottom(), world_h);
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.view_w, self.view_h)
    }

    /// Shift a world rectangle into view coordinates.
    pub fn to_view(&self, r: Rect) -> Rect {
        Rect::new(r.x - self.x, r.y - self.y, r.w, r.h)
    }
}

fn follow_axis(pos: f64, view: f64, lo: f64, hi: f64, world: f64) -> f64 {
    if world <= view {
        return -((view - world) / 2.0).floor();
    }

    // Dead zone: inner 60% of the viewport.
    let margin = view / 5.0;
    let mut pos = pos;
    if lo < pos + margin {
        pos = lo - margin;
    } else if hi > pos + view - margin {
        pos = hi - view + margin;
    }
    pos.max(0.0).min(world - view)
}

pub struct World {
    pub grid: TileGrid,
    pub player: PlayerState,
    pub engine: MovementEngine,
    pub camera: Camera,
    pub tick: u64,
}

impl World {
    pub fn new(grid: TileGrid, engine: MovementEngine, spawn: Vec2) -> Self {
        let player = PlayerState::new(engine.physics().player_size(), spawn);
        World {
            grid,
            player,
            engine,
            camera: Camera::default(),
            tick: 0,
        }
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> Vec<MoveEvent> {
        self.tick += 1;
        let events = self.engine.update(&self.grid, &mut self.player);
        for ev in &events {
            tracing::debug!(tick = self.tick, event = ?ev, "movement event");
        }
        events
    }

    /// Draw the map, the player and a status line.
    pub fn draw<S: Surface>(&mut self, surface: &mut S) {
        let (w, h) = surface.size();
        self.camera.view_w = f64::from(w);
        self.camera.view_h = f64::from(h);
        self.camera.follow(
            self.player.bounds(),
            self.grid.pixel_width(),
            self.grid.pixel_height(),
        );

        draw_grid(&self.grid, surface, &self.camera);
        draw_player(&self.grid, &self.player, surface, &self.camera);

        let p = self.player.position();
        surface.put_text(0, &format!(
            " x:{:>7.1}  y:{:>7.1}  speed x{:<4.1} {}",
            p.x, p.y,
            self.player.speed_multiplier(),
            if self.player.on_ground() { "grounded" } else { "airborne" },
        ));
        surface.put_text(1, " \u{2190}/\u{2192}:Move  Space:Jump  N:Reset  P/M:Speed \u{b1}1  Q:Quit");
    }
}

/// Fill every visible tile. Walls and space get their own shade.
pub fn draw_grid<S: Surface>(grid: &TileGrid, surface: &mut S, camera: &Camera) {
    let ts = grid.tile_size();
    let view = camera.rect();
    for (row, cells) in grid.rows().enumerate() {
        for (column, kind) in cells.iter().enumerate() {
            let tile = Rect::new(column as f64 * ts, row as f64 * ts, ts, ts);
            if !tile.intersects(&view) { continue; }
            let shade = match kind {
                TileKind::Solid => Shade::Wall,
                TileKind::Empty => Shade::Space,
            };
            surface.fill_rect(camera.to_view(tile), shade);
        }
    }
}

/// Player box, plus a landing marker while airborne.
pub fn draw_player<S: Surface>(grid: &TileGrid, player: &PlayerState, surface: &mut S, camera: &Camera) {
    if !player.on_ground() {
        let rest = engine::resting_position(grid, player, player.position());
        let size = player.size();
        let marker = Rect::new(rest.x, rest.y + size.y - 2.0, size.x, 2.0);
        surface.fill_rect(camera.to_view(marker), Shade::Shadow);
    }
    surface.fill_rect(camera.to_view(player.bounds()), Shade::Player);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::intent::Direction;
    use crate::ui::surface::recording::RecordingSurface;

    fn world(rows: &[&str]) -> World {
        let cfg = GameConfig::default();
        let engine = MovementEngine::new(cfg.physics.clone(), cfg.timing.dt());
        World::new(TileGrid::from_ascii(rows, 50), engine, Vec2::new(60.0, 60.0))
    }

    #[test]
    fn tick_advances_counter_and_player() {
        let mut w = world(&["######", "#....#", "#....#", "#....#", "######"]);
        let events = w.tick();
        assert_eq!(w.tick, 1);
        assert!(events.is_empty());
        assert!(w.player.position().y > 60.0);
    }

    #[test]
    fn draw_fills_every_tile_when_map_fits() {
        let mut w = world(&["###", "#.#", "###"]);
        let mut s = RecordingSurface::new(150, 150);
        w.player.teleport_to(Vec2::new(60.0, 78.0));
        w.tick();
        w.draw(&mut s);
        assert_eq!(s.count(Shade::Wall), 8);
        assert_eq!(s.count(Shade::Space), 1);
        assert_eq!(s.count(Shade::Player), 1);
        assert_eq!(s.lines.len(), 2);
        assert!(s.lines[0].1.contains("grounded"));
    }

    #[test]
    fn small_map_is_centered() {
        let mut w = world(&["###", "#.#", "###"]);
        let mut s = RecordingSurface::new(250, 150);
        w.draw(&mut s);
        assert_eq!(w.camera.x, -50.0);
        assert_eq!(w.camera.y, 0.0);
        // Top-left tile lands 50 px in from the left.
        assert_eq!(s.rects[0].0, Rect::new(50.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn airborne_player_draws_landing_marker() {
        let mut w = world(&["####", "#..#", "#..#", "####"]);
        let mut s = RecordingSurface::new(200, 200);
        w.draw(&mut s);
        assert_eq!(s.count(Shade::Shadow), 1);
        let (marker, _) = s.rects.iter().find(|(_, sh)| *sh == Shade::Shadow).copied().unwrap();
        assert_eq!(marker.bottom(), 150.0);
    }

    #[test]
    fn camera_scrolls_on_wide_maps() {
        let row = format!("#{}#", ".".repeat(38));
        let floor = "#".repeat(40);
        let mut w = world(&[row.as_str(), row.as_str(), floor.as_str()]);
        w.player.teleport_to(Vec2::new(60.0, 78.0));
        let mut s = RecordingSurface::new(500, 150);
        w.draw(&mut s);
        assert_eq!(w.camera.x, 0.0);

        w.player.set_turn(Direction::Right, true);
        for _ in 0..400 {
            w.tick();
            w.draw(&mut s);
        }
        assert!(w.camera.x > 0.0);
        let view = w.camera.rect();
        let p = w.player.bounds();
        assert!(p.x >= view.x && p.right() <= view.right());
        assert!(view.right() <= w.grid.pixel_width());
    }
}
