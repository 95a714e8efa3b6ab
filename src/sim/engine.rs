/// The movement engine: advances the player by one tick.
///
/// Processing order:
///   0. Pending teleport
///   1. Horizontal intent (facing, speed multiplier)
///   2. Jump or gravity
///   3. X move + resolve, then Y move + resolve (axis-separated)
///   4. Ground probe
///
/// Collision is swept: every cell the leading edge passes over is checked,
/// nearest first, so no speed can carry the box through a tile. Box spans
/// are half-open, so a box flush against a tile does not touch it. Cells
/// outside the grid are Solid, which makes the map border a wall on all
/// sides and the row below the map an implicit floor.

use crate::config::PhysicsConfig;
use crate::domain::geom::Vec2;
use crate::domain::grid::TileGrid;
use crate::domain::player::PlayerState;
use super::event::MoveEvent;

pub struct MovementEngine {
    physics: PhysicsConfig,
    dt: f64,
}

/// Outcome of moving along one axis.
#[derive(Clone, Copy, PartialEq, Debug)]
enum AxisHit {
    Clear,
    /// Stopped against the cell at this index (column or row).
    Blocked(i64),
}

impl MovementEngine {
    pub fn new(physics: PhysicsConfig, dt: f64) -> Self {
        MovementEngine { physics, dt }
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    // ══════════════════════════════════════════════════════════════
    // Main entry point
    // ══════════════════════════════════════════════════════════════

    pub fn update(&self, grid: &TileGrid, player: &mut PlayerState) -> Vec<MoveEvent> {
        let mut events = Vec::new();

        if let Some(point) = player.intent().take_teleport() {
            player.teleport_to(point);
            events.push(MoveEvent::Teleported { x: point.x, y: point.y });
        }

        self.resolve_intent(player);
        self.resolve_vertical_intent(player, &mut events);

        let was_grounded = player.on_ground;
        self.move_x(grid, player, &mut events);
        self.move_y(grid, player, &mut events);

        if was_grounded && !player.on_ground && player.velocity.y >= 0.0 {
            events.push(MoveEvent::FallStart);
        }

        events
    }

    // ══════════════════════════════════════════════════════════════
    // Intent
    // ══════════════════════════════════════════════════════════════

    fn resolve_intent(&self, player: &mut PlayerState) {
        let facing = player.facing();
        player.velocity.x = facing.sign() * self.physics.base_speed * player.speed_multiplier();
    }

    fn resolve_vertical_intent(&self, player: &mut PlayerState, events: &mut Vec<MoveEvent>) {
        let jump = player.intent().take_jump();

        if jump && player.on_ground {
            player.velocity.y = -self.physics.jump_impulse;
            player.on_ground = false;
            events.push(MoveEvent::Jumped);
        } else if !player.on_ground {
            let vy = player.velocity.y + self.physics.gravity * self.dt;
            player.velocity.y = vy.min(self.physics.terminal_velocity);
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Axis-separated movement
    // ══════════════════════════════════════════════════════════════

    fn move_x(&self, grid: &TileGrid, player: &mut PlayerState, events: &mut Vec<MoveEvent>) {
        let dx = player.velocity.x * self.dt;
        if dx == 0.0 {
            return;
        }

        let b = player.bounds();
        let rows = grid.row_span(b.y, b.bottom());

        let hit = if dx > 0.0 {
            // Columns the right edge enters: past the ones already covered.
            let from = grid.column_span(b.x, b.right()).end() + 1;
            let to = *grid.column_span(b.x + dx, b.right() + dx).end();
            (from..=to).find(|&c| grid.column_blocked(c, rows.clone()))
        } else {
            let from = grid.column_span(b.x, b.right()).start() - 1;
            let to = *grid.column_span(b.x + dx, b.right() + dx).start();
            (to..=from).rev().find(|&c| grid.column_blocked(c, rows.clone()))
        };

        match hit {
            Some(column) => {
                player.position.x = if dx > 0.0 {
                    grid.edge_of(column) - b.w
                } else {
                    grid.edge_of(column + 1)
                };
                player.velocity.x = 0.0;
                events.push(MoveEvent::HitWall { column });
            }
            None => player.position.x += dx,
        }
    }

    fn move_y(&self, grid: &TileGrid, player: &mut PlayerState, events: &mut Vec<MoveEvent>) {
        let dy = player.velocity.y * self.dt;

        match self.sweep_y(grid, player, dy) {
            AxisHit::Blocked(row) if dy > 0.0 => {
                let b = player.bounds();
                player.position.y = grid.edge_of(row) - b.h;
                player.velocity.y = 0.0;
                if !player.on_ground {
                    events.push(MoveEvent::Landed { row });
                }
                player.on_ground = true;
            }
            AxisHit::Blocked(row) => {
                player.position.y = grid.edge_of(row + 1);
                player.velocity.y = 0.0;
                events.push(MoveEvent::Bonked { row });
            }
            AxisHit::Clear => {
                player.position.y += dy;
                // Only a box sitting flush on a solid cell counts as grounded.
                player.on_ground = player.velocity.y >= 0.0 && self.standing_on_solid(grid, player);
                if player.on_ground {
                    player.velocity.y = 0.0;
                }
            }
        }
    }

    fn sweep_y(&self, grid: &TileGrid, player: &PlayerState, dy: f64) -> AxisHit {
        if dy == 0.0 {
            return AxisHit::Clear;
        }

        let b = player.bounds();
        let columns = grid.column_span(b.x, b.right());

        let hit = if dy > 0.0 {
            let from = grid.row_span(b.y, b.bottom()).end() + 1;
            let to = *grid.row_span(b.y + dy, b.bottom() + dy).end();
            (from..=to).find(|&r| grid.row_blocked(r, columns.clone()))
        } else {
            let from = grid.row_span(b.y, b.bottom()).start() - 1;
            let to = *grid.row_span(b.y + dy, b.bottom() + dy).start();
            (to..=from).rev().find(|&r| grid.row_blocked(r, columns.clone()))
        };

        hit.map_or(AxisHit::Clear, AxisHit::Blocked)
    }

    /// Is the box bottom exactly on a tile edge with a solid cell under it?
    fn standing_on_solid(&self, grid: &TileGrid, player: &PlayerState) -> bool {
        let b = player.bounds();
        let below = grid.row_for_y(b.bottom());
        if grid.edge_of(below) != b.bottom() {
            return false;
        }
        grid.row_blocked(below, grid.column_span(b.x, b.right()))
    }
}

/// Where the player would rest if dropped straight down from `position`.
pub fn resting_position(grid: &TileGrid, player: &PlayerState, position: Vec2) -> Vec2 {
    let b = player.bounds_at(position);
    let columns = grid.column_span(b.x, b.right());
    let first = *grid.row_span(b.y, b.bottom()).end() + 1;
    let mut row = first;
    while !grid.row_blocked(row, columns.clone()) {
        row += 1;
    }
    Vec2::new(position.x, grid.edge_of(row) - b.h)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
