//! Fixed-timestep capture clock
//!
//! Host ticks arrive at whatever rate the application runs. The clock
//! accumulates their durations and reports how many capture slots at the
//! fixed cadence have come due. Slots are counted against total elapsed time
//! in integer nanoseconds, so rounding in individual deltas never accumulates.

use std::time::Duration;

/// Deltas converted from floating-point seconds can land a few nanoseconds
/// short of an exact slot boundary.
const TOLERANCE: Duration = Duration::from_micros(1);

#[derive(Debug, Clone)]
pub struct CaptureClock {
    fps: u32,
    elapsed: Duration,
    slots: u64,
}

impl CaptureClock {
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            elapsed: Duration::ZERO,
            slots: 0,
        }
    }

    /// Time between captures
    pub fn interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps
    }

    /// Time accumulated since the last reset
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.slots = 0;
    }

    /// Add `delta` and return how many capture slots became due
    pub fn advance(&mut self, delta: Duration) -> u64 {
        self.elapsed += delta;

        let nanos = (self.elapsed + TOLERANCE).as_nanos();
        let total = (nanos * self.fps as u128 / 1_000_000_000) as u64;

        let due = total.saturating_sub(self.slots);
        self.slots = total;
        due
    }
}
