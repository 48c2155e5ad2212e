/// Smallest elapsed time used for a rate, so back-to-back ticks cannot blow up.
pub const MIN_ELAPSED_SECS: f64 = 1e-3;

/// Turns a monotonically increasing OS counter into a per-second rate.
#[derive(Debug, Clone, Default)]
pub struct RateCounter {
    last: Option<u64>,
}

impl RateCounter {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Counter that already has a baseline, so the first update yields a real rate.
    pub fn primed(value: u64) -> Self {
        Self { last: Some(value) }
    }

    /// Rate between two cumulative readings. A counter that went backwards
    /// (interface reset, wrap) yields 0 rather than a negative rate.
    pub fn sample(prev: u64, curr: u64, elapsed_secs: f64) -> f64 {
        let elapsed = if elapsed_secs.is_finite() {
            elapsed_secs.max(MIN_ELAPSED_SECS)
        } else {
            MIN_ELAPSED_SECS
        };
        curr.saturating_sub(prev) as f64 / elapsed
    }

    /// Records `curr` as the new baseline and returns the rate since the last one.
    /// Without a baseline the rate is 0.
    pub fn update(&mut self, curr: u64, elapsed_secs: f64) -> f64 {
        let rate = match self.last {
            Some(prev) => Self::sample(prev, curr, elapsed_secs),
            None => 0.0,
        };
        self.last = Some(curr);
        rate
    }

    pub fn last(&self) -> Option<u64> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_over_one_second() {
        assert_eq!(RateCounter::sample(100, 150, 1.0), 50.0);
        assert_eq!(RateCounter::sample(100, 100, 1.0), 0.0);
        assert_eq!(RateCounter::sample(0, 300, 2.0), 150.0);
    }

    #[test]
    fn decreasing_counter_clamps_to_zero() {
        assert_eq!(RateCounter::sample(150, 100, 1.0), 0.0);
    }

    #[test]
    fn tiny_elapsed_is_floored() {
        assert_eq!(RateCounter::sample(0, 1, 0.0), 1000.0);
        assert_eq!(RateCounter::sample(0, 1, -5.0), 1000.0);
        assert_eq!(RateCounter::sample(0, 1, f64::NAN), 1000.0);
    }

    #[test]
    fn update_needs_a_baseline() {
        let mut counter = RateCounter::new();
        assert_eq!(counter.update(1000, 1.0), 0.0);
        assert_eq!(counter.update(1500, 0.5), 1000.0);
        assert_eq!(counter.last(), Some(1500));

        let mut primed = RateCounter::primed(10);
        assert_eq!(primed.update(20, 1.0), 10.0);
    }

    #[test]
    fn reset_counter_rebaselines() {
        let mut counter = RateCounter::primed(5000);
        assert_eq!(counter.update(100, 1.0), 0.0);
        assert_eq!(counter.update(300, 1.0), 200.0);
    }
}
