//! Frame timing utilities

use super::rolling_window::RollingWindow;
use std::time::{Duration, Instant};

pub struct FrameTimer {
    frame_start: Instant,
    frame_ms: RollingWindow,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frame_start: Instant::now(),
            frame_ms: RollingWindow::new(capacity),
        }
    }

    pub fn begin(&mut self) {
        self.frame_start = Instant::now();
    }

    pub fn end(&mut self) {
        let elapsed = self.frame_start.elapsed();
        self.record(elapsed);
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.frame_ms.push(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn fps(&self) -> f64 {
        let avg = self.frame_ms.mean();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.frame_ms.mean()
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        self.frame_ms.min_max()
    }
}
