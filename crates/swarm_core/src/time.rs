//! Frame clock
//!
//! Variable per-frame delta fed to the simulate stage, clamped so a stalled
//! frame (window drag, debugger) cannot launch the flock across the bounds.

use std::time::{Duration, Instant};

/// Delta used for the very first frame (60 Hz).
pub const FIRST_FRAME_DELTA: f32 = 1.0 / 60.0;

/// Upper bound on a single frame's delta, in seconds.
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Frame time tracker
pub struct FrameClock {
    last: Option<Instant>,
    frame_count: u64,
    elapsed: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: None,
            frame_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn total_time(&self) -> Duration {
        self.elapsed
    }

    /// Advance one frame and return its delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => FIRST_FRAME_DELTA,
        };
        let delta = delta.min(MAX_FRAME_DELTA);
        self.last = Some(now);
        self.frame_count += 1;
        self.elapsed += Duration::from_secs_f32(delta);
        delta
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
