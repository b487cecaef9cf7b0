use chrono::{NaiveDateTime, Timelike};
use rand::{SeedableRng, rngs::StdRng};

use super::types::{PowerProfile, gaussian_noise};

/// A household load profile with a sinusoidal daily pattern.
///
/// Combines a baseline, a daily sinusoid with configurable amplitude and
/// phase, and seeded Gaussian noise. Stands in for the measured consumption
/// series an external data source would deliver.
#[derive(Debug, Clone)]
pub struct HouseholdLoad {
    /// Baseline consumption in kilowatts.
    pub base_kw: f32,

    /// Amplitude of the daily variation in kilowatts.
    pub amp_kw: f32,

    /// Phase offset of the sinusoid in radians.
    pub phase_rad: f32,

    /// Standard deviation of the Gaussian noise in kilowatts.
    pub noise_std: f32,

    rng: StdRng,
}

impl HouseholdLoad {
    /// Creates a household load profile.
    ///
    /// # Arguments
    ///
    /// * `base_kw` - Baseline consumption in kW
    /// * `amp_kw` - Amplitude of the daily sinusoid in kW
    /// * `phase_rad` - Phase offset in radians (0 = minimum at midnight)
    /// * `noise_std` - Standard deviation of the noise in kW
    /// * `seed` - Random seed for reproducible noise
    pub fn new(base_kw: f32, amp_kw: f32, phase_rad: f32, noise_std: f32, seed: u64) -> Self {
        Self {
            base_kw,
            amp_kw,
            phase_rad,
            noise_std,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PowerProfile for HouseholdLoad {
    /// Consumption in kW at the given timestamp, never negative.
    fn power_kw(&mut self, time: NaiveDateTime) -> f32 {
        let day_pos = time.num_seconds_from_midnight() as f32 / 86_400.0; // [0,1)
        let angle = 2.0 * std::f32::consts::PI * day_pos + self.phase_rad;
        let noise = gaussian_noise(&mut self.rng, self.noise_std);
        (self.base_kw + self.amp_kw * angle.sin() + noise).max(0.0)
    }

    fn profile_type(&self) -> &'static str {
        "HouseholdLoad"
    }
}
