use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use rand::rngs::StdRng;

use super::distribution::EmpiricalDistribution;

/// Stochastic energy forecaster over fixed time-of-week bins.
///
/// A week is partitioned into `7 * (24h / bin_width)` slots, each backed by
/// its own [`EmpiricalDistribution`] of observed per-bin energy amounts.
/// Predicting an interval draws one sample per covered bin and sums them, so
/// repeated predictions over the same interval differ — callers that need
/// reproducibility seed the `StdRng` they pass in.
#[derive(Debug, Clone)]
pub struct RandomForecast {
    bin_width: Duration,
    bins_per_day: usize,
    distributions: Vec<EmpiricalDistribution>,
}

impl RandomForecast {
    /// Creates a forecaster with one-hour bins.
    pub fn new() -> Self {
        Self::with_bin_width(Duration::hours(1))
    }

    /// Creates a forecaster with the given bin width.
    ///
    /// # Panics
    ///
    /// Panics if `bin_width` is not positive or does not divide 24 hours
    /// without remainder.
    pub fn with_bin_width(bin_width: Duration) -> Self {
        let day_seconds = Duration::hours(24).num_seconds();
        let bin_seconds = bin_width.num_seconds();
        assert!(bin_seconds > 0, "bin width must be positive");
        assert!(
            day_seconds % bin_seconds == 0,
            "bin width must divide 24 hours evenly"
        );

        let bins_per_day = (day_seconds / bin_seconds) as usize;
        Self {
            bin_width,
            bins_per_day,
            distributions: vec![EmpiricalDistribution::new(); 7 * bins_per_day],
        }
    }

    /// Width of one time-of-week bin.
    pub fn bin_width(&self) -> Duration {
        self.bin_width
    }

    /// Index of the bin covering `time`: weekday-major, time-of-day minor.
    fn bin_index(&self, time: NaiveDateTime) -> usize {
        let day = time.weekday().num_days_from_monday() as usize;
        let bin_in_day = time.num_seconds_from_midnight() as i64 / self.bin_width.num_seconds();
        day * self.bins_per_day + bin_in_day as usize
    }

    /// Records an observed energy amount (kWh) into the bin covering `time`.
    pub fn update(&mut self, time: NaiveDateTime, energy_kwh: f32) {
        let index = self.bin_index(time);
        self.distributions[index].add_sample(energy_kwh);
    }

    /// Predicts the energy (kWh) over `[from, to)` by drawing one sample per
    /// covered bin.
    ///
    /// The walk advances in `bin_width` increments while the cursor is before
    /// `to`, so an interval not aligned to bin boundaries may include one
    /// trailing partial bin at full weight. `from == to` yields exactly 0.
    pub fn predict_energy_from_to(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
        rng: &mut StdRng,
    ) -> f32 {
        let mut prediction = 0.0;
        let mut current = from;
        while current < to {
            prediction += self.distributions[self.bin_index(current)].sample(rng);
            current += self.bin_width;
        }
        prediction
    }
}

impl Default for RandomForecast {
    fn default() -> Self {
        Self::new()
    }
}
