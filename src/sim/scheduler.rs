/// Fixed-rate tick scheduler.
///
/// Runs a tick callback every `interval` until the stop signal is raised.
/// Pacing is best effort: after a tick the scheduler sleeps for whatever is
/// left of the interval; a tick that overruns is followed immediately by the
/// next one, with no catch-up and no skipped ticks.
///
/// The clock is injected so tests can drive time by hand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of time for the scheduler.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock time via `std::thread::sleep`.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Process-level stop flag, checked between ticks.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        StopSignal::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Counters from one `run`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: u64,
    pub overruns: u64,
}

pub struct Scheduler {
    interval: Duration,
    stop: StopSignal,
}

impl Scheduler {
    pub fn new(interval: Duration, stop: StopSignal) -> Self {
        Scheduler { interval, stop }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `tick` until stopped or until it returns an error.
    pub fn run<C, F, E>(&self, clock: &C, mut tick: F) -> Result<TickStats, E>
    where
        C: Clock,
        F: FnMut() -> Result<(), E>,
    {
        let mut stats = TickStats::default();

        while !self.stop.is_stopped() {
            let start = clock.now();
            tick()?;
            stats.ticks += 1;

            let elapsed = clock.now().saturating_duration_since(start);
            match self.interval.checked_sub(elapsed) {
                Some(wait) if !wait.is_zero() => clock.sleep(wait),
                _ => {
                    stats.overruns += 1;
                    tracing::debug!(
                        tick = stats.ticks,
                        elapsed_us = elapsed.as_micros() as u64,
                        "tick overran its interval"
                    );
                }
            }
        }

        tracing::info!(ticks = stats.ticks, overruns = stats.overruns, "scheduler stopped");
        Ok(stats)
    }
}
