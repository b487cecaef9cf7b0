use rand::{Rng, rngs::StdRng};

/// A growing store of real-valued samples, kept sorted, that can be queried
/// for its median or sampled from.
///
/// Sampling interpolates linearly between neighboring order statistics
/// instead of resampling a raw histogram, which gives a smoother quantile
/// function while per-bin sample counts are still small.
///
/// Samples are only ever appended; the store lives as long as its owner.
#[derive(Debug, Clone, Default)]
pub struct EmpiricalDistribution {
    samples: Vec<f32>,
}

impl EmpiricalDistribution {
    /// Creates an empty distribution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample, keeping the internal sequence sorted.
    ///
    /// Insertion is O(n log n) due to the re-sort; acceptable for the tens to
    /// low hundreds of samples a bin accumulates over months of simulation.
    pub fn add_sample(&mut self, value: f32) {
        self.samples.push(value);
        self.samples.sort_by(f32::total_cmp);
    }

    /// Returns the sample at index `n / 2`, or `None` while empty.
    pub fn median(&self) -> Option<f32> {
        self.samples.get(self.samples.len() / 2).copied()
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` while no samples have been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Draws one value from the distribution.
    ///
    /// With no samples this returns 0.0 and with a single sample it returns
    /// that sample, both deterministically. Otherwise a uniform `p` in
    /// `[0, 1)` selects a pair of neighboring order statistics and the
    /// result is their linear interpolation.
    pub fn sample(&self, rng: &mut StdRng) -> f32 {
        let n = self.samples.len();
        match n {
            0 => 0.0,
            1 => self.samples[0],
            _ => {
                let p: f32 = rng.random();
                let index = (p * (n as f32 - 1.0)) as usize;
                let position = n as f32 * p + (1.0 - p);
                let gamma = position - position.floor();
                let low = self.samples[index];
                let high = self.samples[index + 1];
                (1.0 - gamma) * low + gamma * high
            }
        }
    }
}
