//! Swarm Metrics - frame timing and per-frame pipeline counters
//!
//! Provides zero-cost abstractions for metrics collection that completely
//! vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use swarm_metrics::{FrameTimer, PipelineStats};
//!
//! let mut timer = FrameTimer::new(120);
//! let mut stats = PipelineStats::new(population, 120);
//! timer.begin();
//! let outcome = pipeline.run_frame(&input)?;
//! stats.record(&outcome);
//! timer.end();
//! println!("{:.1} fps, {}", timer.fps(), stats.summary());
//! ```

use std::fmt;

#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod pipeline_stats;
#[cfg(feature = "metrics")]
mod rolling_window;

#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use pipeline_stats::PipelineStats;
#[cfg(feature = "metrics")]
pub use rolling_window::RollingWindow;

/// Snapshot of [`PipelineStats`], printable as one log line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSummary {
    pub frames: u64,
    pub skipped_draws: u64,
    pub obstacle_rebuilds: u64,
    pub mean_visible: f64,
    pub culled_ratio: f64,
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frames={} skipped={} rebuilds={} visible~{:.0} culled={:.1}%",
            self.frames,
            self.skipped_draws,
            self.obstacle_rebuilds,
            self.mean_visible,
            self.culled_ratio * 100.0
        )
    }
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn record(&mut self, _elapsed: std::time::Duration) {}
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn frame_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
pub struct RollingWindow;

#[cfg(not(feature = "metrics"))]
impl RollingWindow {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn push(&mut self, _value: f64) {}
    pub fn mean(&self) -> f64 { 0.0 }
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}

#[cfg(not(feature = "metrics"))]
pub struct PipelineStats;

#[cfg(not(feature = "metrics"))]
impl PipelineStats {
    pub fn new(_population: u32, _capacity: usize) -> Self { Self }
    pub fn record(&mut self, _outcome: &swarm_core::FrameOutcome) {}
    pub fn summary(&self) -> StatsSummary { StatsSummary::default() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiles_without_metrics() {
        // Ensure stubs compile when metrics feature is disabled
        let mut _timer = FrameTimer::new(60);
        let mut _window = RollingWindow::new(10);
        let mut _stats = PipelineStats::new(100, 10);
    }

    #[test]
    fn summary_formats_as_one_line() {
        let summary = StatsSummary {
            frames: 10,
            skipped_draws: 2,
            obstacle_rebuilds: 1,
            mean_visible: 512.4,
            culled_ratio: 0.5,
        };
        let line = summary.to_string();
        assert!(line.contains("skipped=2"));
        assert!(line.contains("culled=50.0%"));
        assert!(!line.contains('\n'));
    }
}
