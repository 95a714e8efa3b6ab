/// PlayerState: the player's kinematic state.
///
/// A passive data holder. Gravity and collision live in the movement
/// engine; input goes through the shared `IntentHandle`. `position` is the
/// top-left corner of the bounding box.

use super::geom::{Rect, Vec2};
use super::intent::{Direction, Facing, IntentHandle};

/// Vertical mode, derived from `on_ground` and the sign of `velocity.y`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(dead_code)]
pub enum VerticalMode {
    Grounded,
    Rising,
    Falling,
}

#[derive(Debug)]
pub struct PlayerState {
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    size: Vec2,
    pub(crate) on_ground: bool,
    intent: IntentHandle,
}

impl PlayerState {
    pub fn new(size: Vec2, spawn: Vec2) -> Self {
        PlayerState {
            position: spawn,
            velocity: Vec2::ZERO,
            size,
            on_ground: false,
            intent: IntentHandle::new(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[allow(dead_code)]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    /// Bounding box at the current position.
    pub fn bounds(&self) -> Rect {
        self.bounds_at(self.position)
    }

    pub fn bounds_at(&self, position: Vec2) -> Rect {
        Rect::new(position.x, position.y, self.size.x, self.size.y)
    }

    #[allow(dead_code)]
    pub fn vertical_mode(&self) -> VerticalMode {
        if self.on_ground {
            VerticalMode::Grounded
        } else if self.velocity.y < 0.0 {
            VerticalMode::Rising
        } else {
            VerticalMode::Falling
        }
    }

    /// A handle input threads can use to steer this player.
    pub fn handle(&self) -> IntentHandle {
        self.intent.clone()
    }

    pub fn facing(&self) -> Facing {
        self.intent.facing()
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.intent.speed_multiplier()
    }

    // ── Guarded setters ──

    #[allow(dead_code)]
    pub fn set_turn(&self, direction: Direction, active: bool) {
        self.intent.set_turn(direction, active);
    }

    #[allow(dead_code)]
    pub fn request_jump(&self) {
        self.intent.request_jump();
    }

    #[allow(dead_code)]
    pub fn adjust_speed(&self, delta: f64) {
        self.intent.adjust_speed(delta);
    }

    /// Move straight to `point` and stop. Gravity resumes next tick.
    pub fn teleport_to(&mut self, point: Vec2) {
        self.position = point;
        self.velocity = Vec2::ZERO;
        self.on_ground = false;
    }

    pub(crate) fn intent(&self) -> &IntentHandle {
        &self.intent
    }
}
