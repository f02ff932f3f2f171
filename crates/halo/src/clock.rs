//! Wall-clock frame timing.

use std::time::{Duration, Instant};

/// Measures the time between consecutive ticks.
///
/// The engine clamps `dt` again; this only reports what really elapsed.
#[derive(Debug, Clone)]
pub struct FrameClock {
    started: Instant,
    last: Instant,
    frames: u64,
}

impl FrameClock {
    /// Starts the clock now.
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last: now,
            frames: 0,
        }
    }

    /// Seconds since the previous call (or since construction).
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        self.frames += 1;
        dt.as_secs_f32()
    }

    /// Sleeps for whatever remains of `frame_budget` since the last tick.
    pub fn pace(&self, frame_budget: Duration) {
        let spent = self.last.elapsed();
        if let Some(remaining) = frame_budget.checked_sub(spent) {
            std::thread::sleep(remaining);
        }
    }

    /// Time since the clock started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Ticks so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
