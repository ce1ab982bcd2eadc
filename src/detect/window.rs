// Rolling window of recent loudness samples
//
// Fixed-capacity FIFO over the most recent N loudness scalars. The
// window is owned and mutated by the detection loop alone, so snapshot
// consistency needs no locking. Insertion order is temporal order and
// is preserved; trend and correlation scoring depend on it.

use std::collections::VecDeque;

/// One loudness reading: the frame counter it came from and the mean
/// absolute amplitude of that frame. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoudnessSample {
    pub index: u64,
    pub volume: f64,
}

/// Fixed-capacity, insertion-ordered buffer of the most recent samples.
#[derive(Debug)]
pub struct RollingWindow {
    samples: VecDeque<LoudnessSample>,
    capacity: usize,
}

impl RollingWindow {
    /// Create a window holding at most `capacity` samples. The capacity
    /// equals the length of the loaded baseline profile.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be greater than 0");
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a sample, evicting and returning the oldest one when the
    /// window is already at capacity. O(1) amortized.
    pub fn push(&mut self, sample: LoudnessSample) -> Option<LoudnessSample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Ordered copy of the current contents, oldest first. O(N).
    pub fn snapshot(&self) -> Vec<LoudnessSample> {
        self.samples.iter().copied().collect()
    }

    /// Ordered copy of just the volume values, oldest first.
    pub fn volumes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.volume).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True once `capacity` samples have arrived; scoring is gated on
    /// this to enforce the cold-start grace period.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
