use chrono::{NaiveDateTime, Timelike};
use rand::{SeedableRng, rngs::StdRng};

use super::types::{PowerProfile, gaussian_noise};

/// A rooftop solar PV profile with a half-sine daylight curve.
///
/// Generation rises from zero at sunrise to `kw_peak` at the midpoint of the
/// daylight window and back to zero at sunset, with multiplicative seeded
/// noise for weather variation. Stands in for the measured PV series an
/// external data source would deliver.
#[derive(Debug, Clone)]
pub struct SolarPv {
    /// Peak generation in kilowatts under ideal conditions.
    pub kw_peak: f32,

    /// Hour of day at which generation starts (inclusive).
    pub sunrise_hour: f32,

    /// Hour of day at which generation ends (exclusive).
    pub sunset_hour: f32,

    /// Standard deviation of the noise as a fraction of output.
    pub noise_std: f32,

    rng: StdRng,
}

impl SolarPv {
    /// Creates a PV profile.
    ///
    /// # Panics
    ///
    /// Panics if `sunrise_hour >= sunset_hour` or `sunset_hour > 24`.
    pub fn new(
        kw_peak: f32,
        sunrise_hour: f32,
        sunset_hour: f32,
        noise_std: f32,
        seed: u64,
    ) -> Self {
        assert!(sunrise_hour < sunset_hour && sunset_hour <= 24.0);
        Self {
            kw_peak: kw_peak.max(0.0),
            sunrise_hour,
            sunset_hour,
            noise_std: noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PowerProfile for SolarPv {
    /// Generation in kW at the given timestamp, never negative.
    fn power_kw(&mut self, time: NaiveDateTime) -> f32 {
        let hour = time.num_seconds_from_midnight() as f32 / 3600.0;
        if hour < self.sunrise_hour || hour >= self.sunset_hour {
            return 0.0;
        }

        let frac = ((hour - self.sunrise_hour) / (self.sunset_hour - self.sunrise_hour)
            * std::f32::consts::PI)
            .sin();
        let noise_mult = 1.0 + gaussian_noise(&mut self.rng, self.noise_std);
        (self.kw_peak * frac * noise_mult).max(0.0)
    }

    fn profile_type(&self) -> &'static str {
        "SolarPv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 7, 1)
            .and_then(|d| d.and_hms_opt(h, min, 0))
            .expect("valid timestamp")
    }

    #[test]
    #[should_panic]
    fn sunset_before_sunrise_panics() {
        SolarPv::new(4.0, 20.0, 6.0, 0.0, 42);
    }

    #[test]
    fn no_generation_at_night() {
        let mut pv = SolarPv::new(4.0, 6.0, 20.0, 0.0, 42);
        assert_eq!(pv.power_kw(at(0, 0)), 0.0);
        assert_eq!(pv.power_kw(at(5, 59)), 0.0);
        assert_eq!(pv.power_kw(at(20, 0)), 0.0);
        assert_eq!(pv.power_kw(at(23, 0)), 0.0);
    }

    #[test]
    fn peak_at_midday() {
        let mut pv = SolarPv::new(4.0, 6.0, 20.0, 0.0, 42);
        // Midpoint of the 06:00..20:00 window is 13:00.
        let peak = pv.power_kw(at(13, 0));
        assert!((peak - 4.0).abs() < 1e-4);
        assert!(pv.power_kw(at(7, 0)) < peak);
    }

    #[test]
    fn generation_is_never_negative() {
        let mut pv = SolarPv::new(4.0, 6.0, 20.0, 0.3, 42);
        for h in 0..24 {
            assert!(pv.power_kw(at(h, 30)) >= 0.0);
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut a = SolarPv::new(4.0, 6.0, 20.0, 0.1, 7);
        let mut b = SolarPv::new(4.0, 6.0, 20.0, 0.1, 7);
        for h in 0..24 {
            assert_eq!(a.power_kw(at(h, 0)), b.power_kw(at(h, 0)));
        }
    }
}
