use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 60;

/// Fixed-length history for one metric. Always holds exactly `capacity`
/// samples: it starts filled and every push evicts the oldest one.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingSeries {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl RollingSeries {
    /// A capacity of 0 is bumped to 1.
    pub fn new(capacity: usize, fill: f64) -> Self {
        let capacity = capacity.max(1);
        let mut samples = VecDeque::with_capacity(capacity);
        samples.resize(capacity, fill);
        Self { samples, capacity }
    }

    pub fn push(&mut self, value: f64) {
        self.samples.pop_front();
        self.samples.push_back(value);
    }

    /// Oldest-first copy.
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn latest(&self) -> f64 {
        self.samples.back().copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RollingSeries {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, 0.0)
    }
}
