//! Common traits and helpers for profile devices.

use chrono::NaiveDateTime;
use rand::{Rng, rngs::StdRng};

/// A time-driven power source feeding the simulation with readings.
///
/// Profiles stand in for the external household/PV data source: the runner
/// polls each profile once per tick and routes the reading to a battery
/// attribute or the consumer pool.
pub trait PowerProfile {
    /// Power reading in kW at the given timestamp (non-negative).
    fn power_kw(&mut self, time: NaiveDateTime) -> f32;

    /// Human-readable type name for the profile.
    fn profile_type(&self) -> &'static str;
}

/// Gaussian noise via the Box-Muller transform.
///
/// Returns a value from a Gaussian with mean 0 and the given standard
/// deviation; 0.0 when `std_dev` is non-positive.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f32) -> f32 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f32 = rng.random::<f32>().clamp(1e-6, 1.0);
    let u2: f32 = rng.random::<f32>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
    z0 * std_dev
}
