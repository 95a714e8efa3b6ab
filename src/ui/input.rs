/// Input thread.
///
/// Reads terminal key events on its own thread and turns them into intent
/// updates through an `IntentHandle`. The simulation never reads the
/// terminal directly.
///
/// Key release comes from crossterm's keyboard enhancement when the terminal
/// supports it. Otherwise a held key is considered released once no
/// Press/Repeat event has arrived for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::geom::Vec2;
use crate::domain::intent::{Direction, IntentHandle};
use crate::sim::scheduler::StopSignal;

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Speed multiplier step for the P / M keys.
const SPEED_STEP: f64 = 1.0;

/// What a key event asks for.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Command {
    Turn(Direction, bool),
    Jump,
    Reset,
    AdjustSpeed(f64),
    Quit,
}

/// Map a key event to a command. `None` for keys the game ignores.
pub fn map_key(key: &KeyEvent) -> Option<Command> {
    let pressed = key.kind != KeyEventKind::Release;

    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
    {
        return pressed.then_some(Command::Quit);
    }

    match key.code {
        KeyCode::Left => Some(Command::Turn(Direction::Left, pressed)),
        KeyCode::Right => Some(Command::Turn(Direction::Right, pressed)),
        // One-shot keys only fire on press.
        _ if !pressed => None,
        KeyCode::Char(' ') => Some(Command::Jump),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Command::Reset),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Command::AdjustSpeed(SPEED_STEP)),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Command::AdjustSpeed(-SPEED_STEP)),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

/// Apply a command to the intent handle (or the stop signal).
pub fn apply(command: Command, intent: &IntentHandle, stop: &StopSignal, reset_point: Vec2) {
    match command {
        Command::Turn(dir, active) => intent.set_turn(dir, active),
        Command::Jump => intent.request_jump(),
        Command::Reset => intent.teleport_to(reset_point),
        Command::AdjustSpeed(delta) => {
            intent.adjust_speed(delta);
            tracing::info!(multiplier = intent.speed_multiplier(), "speed adjusted");
        }
        Command::Quit => stop.stop(),
    }
}

/// Held-key tracker for terminals that never send Release.
struct HoldTracker {
    last_active: HashMap<Direction, Instant>,
    honor_release: bool,
}

impl HoldTracker {
    fn new(honor_release: bool) -> Self {
        HoldTracker {
            last_active: HashMap::with_capacity(2),
            honor_release,
        }
    }

    /// Filter a turn command. Returns the command to apply, if any.
    fn observe(&mut self, dir: Direction, active: bool, now: Instant) -> Option<Command> {
        if active {
            let fresh = self.last_active.insert(dir, now).is_none();
            // Repeats only refresh the timestamp; re-setting would bump the
            // flag's stamp and steal "last pressed" from the other key.
            return fresh.then_some(Command::Turn(dir, true));
        }
        if self.honor_release && self.last_active.remove(&dir).is_some() {
            return Some(Command::Turn(dir, false));
        }
        None
    }

    /// Release keys that timed out.
    fn expire(&mut self, now: Instant) -> Vec<Command> {
        if self.honor_release {
            return vec![];
        }
        let expired: Vec<Direction> = self
            .last_active
            .iter()
            .filter(|(_, t)| now.duration_since(**t) >= HOLD_TIMEOUT)
            .map(|(d, _)| *d)
            .collect();
        expired
            .into_iter()
            .map(|d| {
                self.last_active.remove(&d);
                Command::Turn(d, false)
            })
            .collect()
    }
}

/// Spawn the input thread. It exits when `stop` is raised.
pub fn spawn(
    intent: IntentHandle,
    stop: StopSignal,
    reset_point: Vec2,
    honor_release: bool,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("input".into())
        .spawn(move || {
            let mut holds = HoldTracker::new(honor_release);
            while !stop.is_stopped() {
                match event::poll(POLL_INTERVAL) {
                    Ok(true) => match event::read() {
                        Ok(Event::Key(key)) => {
                            if let Some(cmd) = map_key(&key) {
                                let cmd = match cmd {
                                    Command::Turn(dir, active) => {
                                        holds.observe(dir, active, Instant::now())
                                    }
                                    other => Some(other),
                                };
                                if let Some(cmd) = cmd {
                                    apply(cmd, &intent, &stop, reset_point);
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            tracing::error!(error = %e, "input read failed, stopping");
                            stop.stop();
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "input poll failed, stopping");
                        stop.stop();
                    }
                }

                for cmd in holds.expire(Instant::now()) {
                    apply(cmd, &intent, &stop, reset_point);
                }
            }
            tracing::debug!("input thread exiting");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::intent::Facing;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        key(code, KeyEventKind::Press)
    }

    #[test]
    fn arrows_turn_on_press_and_release() {
        assert_eq!(map_key(&press(KeyCode::Left)), Some(Command::Turn(Direction::Left, true)));
        assert_eq!(
            map_key(&key(KeyCode::Right, KeyEventKind::Release)),
            Some(Command::Turn(Direction::Right, false))
        );
    }

    #[test]
    fn game_key_bindings() {
        assert_eq!(map_key(&press(KeyCode::Char(' '))), Some(Command::Jump));
        assert_eq!(map_key(&press(KeyCode::Char('n'))), Some(Command::Reset));
        assert_eq!(map_key(&press(KeyCode::Char('p'))), Some(Command::AdjustSpeed(1.0)));
        assert_eq!(map_key(&press(KeyCode::Char('M'))), Some(Command::AdjustSpeed(-1.0)));
        assert_eq!(map_key(&press(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(map_key(&press(KeyCode::Char('z'))), None);
    }

    #[test]
    fn one_shot_keys_ignore_release() {
        assert_eq!(map_key(&key(KeyCode::Char(' '), KeyEventKind::Release)), None);
        assert_eq!(map_key(&key(KeyCode::Char('p'), KeyEventKind::Release)), None);
    }

    #[test]
    fn ctrl_c_quits() {
        let mut k = press(KeyCode::Char('c'));
        k.modifiers = KeyModifiers::CONTROL;
        assert_eq!(map_key(&k), Some(Command::Quit));
    }

    #[test]
    fn apply_routes_to_intent_and_stop() {
        let intent = IntentHandle::new();
        let stop = StopSignal::new();
        let reset = Vec2::new(600.0, 70.0);

        apply(Command::Turn(Direction::Right, true), &intent, &stop, reset);
        assert_eq!(intent.facing(), Facing::Right);

        apply(Command::Jump, &intent, &stop, reset);
        assert!(intent.jump_pending());

        apply(Command::AdjustSpeed(1.0), &intent, &stop, reset);
        assert_eq!(intent.speed_multiplier(), 2.0);

        apply(Command::Reset, &intent, &stop, reset);
        assert_eq!(intent.take_teleport(), Some(reset));

        assert!(!stop.is_stopped());
        apply(Command::Quit, &intent, &stop, reset);
        assert!(stop.is_stopped());
    }

    #[test]
    fn repeats_do_not_restamp_held_key() {
        let mut holds = HoldTracker::new(false);
        let t0 = Instant::now();
        assert_eq!(
            holds.observe(Direction::Left, true, t0),
            Some(Command::Turn(Direction::Left, true))
        );
        assert_eq!(holds.observe(Direction::Left, true, t0 + Duration::from_millis(30)), None);
    }

    #[test]
    fn held_key_times_out_without_release_support() {
        let mut holds = HoldTracker::new(false);
        let t0 = Instant::now();
        holds.observe(Direction::Right, true, t0);
        assert!(holds.expire(t0 + Duration::from_millis(100)).is_empty());
        assert_eq!(
            holds.expire(t0 + HOLD_TIMEOUT),
            vec![Command::Turn(Direction::Right, false)]
        );
        // Next press is fresh again.
        assert!(holds.observe(Direction::Right, true, t0 + HOLD_TIMEOUT).is_some());
    }

    #[test]
    fn release_events_honored_when_supported() {
        let mut holds = HoldTracker::new(true);
        let t0 = Instant::now();
        holds.observe(Direction::Left, true, t0);
        assert!(holds.expire(t0 + Duration::from_secs(5)).is_empty());
        assert_eq!(
            holds.observe(Direction::Left, false, t0),
            Some(Command::Turn(Direction::Left, false))
        );
        // Stray release for a key we never saw pressed.
        assert_eq!(holds.observe(Direction::Right, false, t0), None);
    }

    #[test]
    fn release_ignored_without_support() {
        let mut holds = HoldTracker::new(false);
        let t0 = Instant::now();
        holds.observe(Direction::Left, true, t0);
        assert_eq!(holds.observe(Direction::Left, false, t0), None);
    }
}
