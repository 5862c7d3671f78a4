//! Per-frame pipeline counters

use swarm_core::FrameOutcome;

use super::rolling_window::RollingWindow;
use crate::StatsSummary;

pub struct PipelineStats {
    population: u32,
    visible: RollingWindow,
    frames: u64,
    skipped_draws: u64,
    obstacle_rebuilds: u64,
}

impl PipelineStats {
    pub fn new(population: u32, capacity: usize) -> Self {
        Self {
            population,
            visible: RollingWindow::new(capacity),
            frames: 0,
            skipped_draws: 0,
            obstacle_rebuilds: 0,
        }
    }

    pub fn record(&mut self, outcome: &FrameOutcome) {
        self.frames += 1;
        if outcome.draw.is_none() {
            self.skipped_draws += 1;
        }
        if outcome.obstacles_rebuilt {
            self.obstacle_rebuilds += 1;
        }
        if let Some(count) = outcome.visible_count {
            self.visible.push(f64::from(count));
        }
    }

    /// Share of the population rejected by the visibility stage, averaged
    /// over the window. Zero until a culled frame is recorded.
    pub fn culled_ratio(&self) -> f64 {
        if self.visible.is_empty() || self.population == 0 {
            return 0.0;
        }
        1.0 - self.visible.mean() / f64::from(self.population)
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            frames: self.frames,
            skipped_draws: self.skipped_draws,
            obstacle_rebuilds: self.obstacle_rebuilds,
            mean_visible: self.visible.mean(),
            culled_ratio: self.culled_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(visible: Option<u32>, drawn: bool, rebuilt: bool) -> FrameOutcome {
        use swarm_core::{DrawIndexedIndirectArgs, DrawSource, DrawSubmission};
        FrameOutcome {
            draw: drawn.then(|| DrawSubmission {
                args: DrawIndexedIndirectArgs::new(24, 0, 0, visible.unwrap_or(100)),
                source: DrawSource::Visible,
            }),
            visible_count: visible,
            obstacles_rebuilt: rebuilt,
            frame_index: 0,
        }
    }

    #[test]
    fn counts_skips_rebuilds_and_culling() {
        let mut stats = PipelineStats::new(100, 8);
        stats.record(&outcome(Some(25), true, true));
        stats.record(&outcome(Some(75), true, false));
        stats.record(&outcome(None, false, false));

        let summary = stats.summary();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.skipped_draws, 1);
        assert_eq!(summary.obstacle_rebuilds, 1);
        assert_eq!(summary.mean_visible, 50.0);
        assert!((summary.culled_ratio - 0.5).abs() < 1e-9);
    }
}
