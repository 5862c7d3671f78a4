//! Fixed-capacity window of recent samples

pub struct RollingWindow {
    samples: Vec<f64>,
    capacity: usize,
    index: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            index: 0,
        }
    }

    pub fn push(&mut self, sample: f64) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.index] = sample;
        }
        self.index = (self.index + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn min_max(&self) -> (f64, f64) {
        if self.samples.is_empty() {
            return (0.0, 0.0);
        }
        self.samples
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window() {
        let mut window = RollingWindow::new(3);

        window.push(10.0);
        assert_eq!(window.mean(), 10.0);

        window.push(20.0);
        assert_eq!(window.mean(), 15.0);

        window.push(30.0);
        assert_eq!(window.mean(), 20.0);

        // Should wrap around
        window.push(40.0);
        assert_eq!(window.mean(), 30.0); // (20 + 30 + 40) / 3
        assert_eq!(window.min_max(), (20.0, 40.0));
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn zero_capacity_still_holds_one_sample() {
        let mut window = RollingWindow::new(0);
        window.push(1.0);
        window.push(2.0);
        assert_eq!(window.len(), 1);
        assert_eq!(window.mean(), 2.0);
    }
}
