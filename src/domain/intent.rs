/// Player intent: what input handling asks the engine to do next tick.
///
/// Written from the input thread, read from the simulation thread. Every
/// field is an independent atomic cell; no update needs two fields to change
/// together, so no lock is taken except for the pending teleport point.
///
/// ## Turn resolution
///
/// Left and right are separate flags and may both be held. Each `set_turn`
/// stamps the flag with a fresh sequence number; when both are active the
/// most recently set one wins.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::geom::Vec2;

/// Turn direction requested by input.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Left,
    Right,
}

/// Effective horizontal intent for one tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
    None,
}

impl Facing {
    /// -1, 0 or +1 along the x axis.
    pub fn sign(self) -> f64 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
            Facing::None => 0.0,
        }
    }
}

#[derive(Debug, Default)]
struct TurnFlag {
    active: AtomicBool,
    stamp: AtomicU64,
}

#[derive(Debug)]
struct IntentCell {
    left: TurnFlag,
    right: TurnFlag,
    seq: AtomicU64,
    jump_requested: AtomicBool,
    /// f64 bits.
    speed_multiplier: AtomicU64,
    teleport: Mutex<Option<Vec2>>,
}

/// Cloneable, thread-safe handle to a player's intent.
///
/// These four operations are the only way anything outside the simulation
/// changes the player.
#[derive(Clone, Debug)]
pub struct IntentHandle {
    cell: Arc<IntentCell>,
}

impl IntentHandle {
    pub(crate) fn new() -> Self {
        IntentHandle {
            cell: Arc::new(IntentCell {
                left: TurnFlag::default(),
                right: TurnFlag::default(),
                seq: AtomicU64::new(0),
                jump_requested: AtomicBool::new(false),
                speed_multiplier: AtomicU64::new(1.0f64.to_bits()),
                teleport: Mutex::new(None),
            }),
        }
    }

    /// Set or clear a turn flag. Never moves the player by itself.
    pub fn set_turn(&self, direction: Direction, active: bool) {
        let flag = match direction {
            Direction::Left => &self.cell.left,
            Direction::Right => &self.cell.right,
        };
        let stamp = self.cell.seq.fetch_add(1, Ordering::Relaxed) + 1;
        flag.stamp.store(stamp, Ordering::Relaxed);
        flag.active.store(active, Ordering::Release);
    }

    /// Ask for a jump on the next tick. Consumed whether or not it succeeds.
    pub fn request_jump(&self) {
        self.cell.jump_requested.store(true, Ordering::Release);
    }

    /// Queue a teleport; applied at the start of the next update.
    pub fn teleport_to(&self, point: Vec2) {
        *self.teleport_slot() = Some(point);
    }

    /// Add `delta` to the speed multiplier. Not clamped: zero stalls
    /// horizontal motion, negative reverses it.
    pub fn adjust_speed(&self, delta: f64) {
        let _ = self
            .cell
            .speed_multiplier
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + delta).to_bits())
            });
    }

    // ── Engine side ──

    /// Resolve both turn flags into one facing; last-set wins.
    pub fn facing(&self) -> Facing {
        let left = self.cell.left.active.load(Ordering::Acquire);
        let right = self.cell.right.active.load(Ordering::Acquire);
        match (left, right) {
            (false, false) => Facing::None,
            (true, false) => Facing::Left,
            (false, true) => Facing::Right,
            (true, true) => {
                let l = self.cell.left.stamp.load(Ordering::Relaxed);
                let r = self.cell.right.stamp.load(Ordering::Relaxed);
                if l > r { Facing::Left } else { Facing::Right }
            }
        }
    }

    pub fn speed_multiplier(&self) -> f64 {
        f64::from_bits(self.cell.speed_multiplier.load(Ordering::Acquire))
    }

    #[allow(dead_code)]
    pub fn jump_pending(&self) -> bool {
        self.cell.jump_requested.load(Ordering::Acquire)
    }

    /// Read and clear the jump request.
    pub(crate) fn take_jump(&self) -> bool {
        self.cell.jump_requested.swap(false, Ordering::AcqRel)
    }

    /// Read and clear the pending teleport.
    pub(crate) fn take_teleport(&self) -> Option<Vec2> {
        self.teleport_slot().take()
    }

    /// The slot only ever holds a plain point, so a panic elsewhere while it
    /// was locked cannot leave it half-written.
    fn teleport_slot(&self) -> MutexGuard<'_, Option<Vec2>> {
        self.cell.teleport.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_is_none() {
        let h = IntentHandle::new();
        assert_eq!(h.facing(), Facing::None);
    }

    #[test]
    fn single_flag_resolves() {
        let h = IntentHandle::new();
        h.set_turn(Direction::Left, true);
        assert_eq!(h.facing(), Facing::Left);
        h.set_turn(Direction::Left, false);
        h.set_turn(Direction::Right, true);
        assert_eq!(h.facing(), Facing::Right);
    }

    #[test]
    fn last_set_wins_when_both_held() {
        let h = IntentHandle::new();
        h.set_turn(Direction::Left, true);
        h.set_turn(Direction::Right, true);
        assert_eq!(h.facing(), Facing::Right);

        // Re-pressing left makes it the newest.
        h.set_turn(Direction::Left, true);
        assert_eq!(h.facing(), Facing::Left);

        // Releasing the winner falls back to the other held key.
        h.set_turn(Direction::Left, false);
        assert_eq!(h.facing(), Facing::Right);
    }

    #[test]
    fn jump_is_consumed_once() {
        let h = IntentHandle::new();
        assert!(!h.take_jump());
        h.request_jump();
        assert!(h.jump_pending());
        assert!(h.take_jump());
        assert!(!h.take_jump());
    }

    #[test]
    fn speed_adjusts_without_clamping() {
        let h = IntentHandle::new();
        assert_eq!(h.speed_multiplier(), 1.0);
        h.adjust_speed(1.0);
        assert_eq!(h.speed_multiplier(), 2.0);
        h.adjust_speed(-3.5);
        assert_eq!(h.speed_multiplier(), -1.5);
    }

    #[test]
    fn teleport_is_taken_once() {
        let h = IntentHandle::new();
        h.teleport_to(Vec2::new(600.0, 70.0));
        assert_eq!(h.take_teleport(), Some(Vec2::new(600.0, 70.0)));
        assert_eq!(h.take_teleport(), None);
    }

    #[test]
    fn teleport_survives_a_poisoned_slot() {
        let h = IntentHandle::new();
        let remote = h.clone();
        let crashed = std::thread::spawn(move || {
            let _slot = remote.cell.teleport.lock().unwrap();
            panic!("input thread died while holding the slot");
        })
        .join();
        assert!(crashed.is_err());
        assert!(h.cell.teleport.is_poisoned());

        h.teleport_to(Vec2::new(600.0, 70.0));
        assert_eq!(h.take_teleport(), Some(Vec2::new(600.0, 70.0)));
        assert_eq!(h.take_teleport(), None);
    }

    #[test]
    fn handle_is_shared_across_threads() {
        let h = IntentHandle::new();
        let remote = h.clone();
        std::thread::spawn(move || {
            remote.set_turn(Direction::Right, true);
            remote.request_jump();
        })
        .join()
        .unwrap();
        assert_eq!(h.facing(), Facing::Right);
        assert!(h.jump_pending());
    }
}
