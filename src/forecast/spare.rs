use chrono::{Duration, NaiveDateTime, NaiveTime};
use rand::{SeedableRng, rngs::StdRng};

use super::distribution::EmpiricalDistribution;
use super::energy::RandomForecast;
use crate::units::{energy_to_power_kw, power_to_energy_kwh};

/// Read-only snapshot of a battery's state for one step, handed to
/// predictors alongside the timestamp.
///
/// Predictors never own or mutate the battery; the battery builds this view
/// after its power balance is known and passes it into both trait methods.
#[derive(Debug, Clone, Copy)]
pub struct BatteryState {
    /// Total energy capacity (kWh).
    pub capacity_kwh: f32,
    /// Stored energy at the start of this step (kWh).
    pub charge_kwh: f32,
    /// This step's summed consumption reading (kW, >= 0).
    pub power_consumption_kw: f32,
    /// This step's summed generation reading (kW, >= 0).
    pub power_generation_kw: f32,
    /// `generation - consumption` for this step (kW, signed).
    pub power_balance_kw: f32,
    /// Fixed step duration (seconds).
    pub step_seconds: u32,
}

/// Estimates how much power a battery can export this step without risking
/// its own future balance.
///
/// Implementations are chosen per battery at construction time.
pub trait PowerPredictor {
    /// Ingests this step's readings into the predictor's statistics.
    ///
    /// Must be called with monotonically non-decreasing timestamps.
    fn update_statistics(&mut self, time: NaiveDateTime, battery: &BatteryState);

    /// Returns the power (kW, >= 0) the battery can spare this step.
    fn predict_spare_power_kw(&mut self, time: NaiveDateTime, battery: &BatteryState) -> f32;
}

/// Predictor that offers a fixed quarter of the stored charge every step,
/// regardless of any forecast. Useful as a naive baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct GiveAllPredictor;

impl PowerPredictor for GiveAllPredictor {
    fn update_statistics(&mut self, _time: NaiveDateTime, _battery: &BatteryState) {}

    fn predict_spare_power_kw(&mut self, _time: NaiveDateTime, battery: &BatteryState) -> f32 {
        energy_to_power_kw(battery.charge_kwh / 4.0, battery.step_seconds as f32)
    }
}

/// Forecast-driven spare-power estimator.
///
/// Tracks two weekly-binned energy forecasts (consumption and generation)
/// plus the time of day at which the battery's power balance last turned
/// positive, collected across days. The spare-power estimate is the charge
/// (or forecast surplus) the battery can give away while still expecting a
/// non-negative balance at the next relevant point in time.
#[derive(Debug, Clone)]
pub struct SparePowerPredictor {
    consumption: RandomForecast,
    generation: RandomForecast,
    rng: StdRng,
    last_step: Option<NaiveDateTime>,
    last_positive_balance_today: Option<NaiveDateTime>,
    /// Seconds-into-day at which the balance last went positive, one sample
    /// committed per completed day.
    positive_balance_times: EmpiricalDistribution,
}

impl SparePowerPredictor {
    /// Creates a predictor with one-hour forecast bins.
    pub fn new(seed: u64) -> Self {
        Self::with_bin_width(Duration::hours(1), seed)
    }

    /// Creates a predictor with a custom forecast bin width.
    ///
    /// # Panics
    ///
    /// Panics if `bin_width` does not divide 24 hours evenly.
    pub fn with_bin_width(bin_width: Duration, seed: u64) -> Self {
        Self {
            consumption: RandomForecast::with_bin_width(bin_width),
            generation: RandomForecast::with_bin_width(bin_width),
            rng: StdRng::seed_from_u64(seed),
            last_step: None,
            last_positive_balance_today: None,
            positive_balance_times: EmpiricalDistribution::new(),
        }
    }

    /// Timestamp of the first hour boundary within the next 24 hours at
    /// which the forecast balance turns positive, if any.
    fn time_of_next_positive_balance(&mut self, time: NaiveDateTime) -> Option<NaiveDateTime> {
        for hour in 0..24 {
            let from = time + Duration::hours(hour);
            let to = time + Duration::hours(hour + 1);
            let consumption = self.consumption.predict_energy_from_to(from, to, &mut self.rng);
            let generation = self.generation.predict_energy_from_to(from, to, &mut self.rng);
            if generation - consumption > 0.0 {
                return Some(from);
            }
        }
        None
    }

    /// Historically typical time of day at which today's balance last turns
    /// positive, projected onto `time`'s date.
    ///
    /// Falls back to one second past `time` when the historical point has
    /// already passed today. `None` until at least one day has been
    /// committed into the distribution.
    fn time_of_last_positive_balance_today(&self, time: NaiveDateTime) -> Option<NaiveDateTime> {
        let seconds_into_day = self.positive_balance_times.median()?;
        let candidate =
            time.date().and_time(NaiveTime::MIN) + Duration::seconds(seconds_into_day as i64);
        if candidate < time {
            Some(time + Duration::seconds(1))
        } else {
            Some(candidate)
        }
    }
}

impl PowerPredictor for SparePowerPredictor {
    fn update_statistics(&mut self, time: NaiveDateTime, battery: &BatteryState) {
        match self.last_step {
            None => {
                self.last_step = Some(time);
                self.last_positive_balance_today = Some(time);
            }
            Some(previous) if previous.date() < time.date() => {
                if let Some(last_positive) = self.last_positive_balance_today {
                    let seconds_into_day =
                        (last_positive - last_positive.date().and_time(NaiveTime::MIN))
                            .num_seconds();
                    self.positive_balance_times.add_sample(seconds_into_day as f32);
                }
                self.last_step = Some(time);
            }
            _ => {}
        }

        if battery.power_balance_kw > 0.0 {
            self.last_positive_balance_today = Some(time);
        }

        let bin_seconds = self.consumption.bin_width().num_seconds() as f32;
        self.consumption
            .update(time, power_to_energy_kwh(battery.power_consumption_kw, bin_seconds));
        self.generation
            .update(time, power_to_energy_kwh(battery.power_generation_kw, bin_seconds));
    }

    fn predict_spare_power_kw(&mut self, time: NaiveDateTime, battery: &BatteryState) -> f32 {
        let power_balance = battery.power_balance_kw;
        self.update_statistics(time, battery);

        let target = if power_balance <= 0.0 {
            self.time_of_next_positive_balance(time)
        } else {
            self.time_of_last_positive_balance_today(time)
        };
        let Some(target) = target else {
            return 0.0;
        };

        let generation = self.generation.predict_energy_from_to(time, target, &mut self.rng);
        let consumption = self.consumption.predict_energy_from_to(time, target, &mut self.rng);
        let delta = generation - consumption;

        let spare_energy_kwh = if power_balance <= 0.0 {
            // How much of the stored charge survives until the balance is
            // forecast to recover.
            (battery.charge_kwh + delta).max(0.0)
        } else {
            // Forecast surplus beyond what the battery itself can absorb.
            let missing_kwh = battery.capacity_kwh - battery.charge_kwh;
            (delta - missing_kwh).max(0.0)
        };

        let horizon_seconds = (target - time).num_seconds();
        energy_to_power_kw(spare_energy_kwh, horizon_seconds as f32)
    }
}

/// Concrete predictor selected per battery at construction.
#[derive(Debug, Clone)]
pub enum Predictor {
    /// Forecast-driven estimator.
    SparePower(SparePowerPredictor),
    /// Naive quarter-of-charge baseline.
    GiveAll(GiveAllPredictor),
}

impl PowerPredictor for Predictor {
    fn update_statistics(&mut self, time: NaiveDateTime, battery: &BatteryState) {
        match self {
            Self::SparePower(predictor) => predictor.update_statistics(time, battery),
            Self::GiveAll(predictor) => predictor.update_statistics(time, battery),
        }
    }

    fn predict_spare_power_kw(&mut self, time: NaiveDateTime, battery: &BatteryState) -> f32 {
        match self {
            Self::SparePower(predictor) => predictor.predict_spare_power_kw(time, battery),
            Self::GiveAll(predictor) => predictor.predict_spare_power_kw(time, battery),
        }
    }
}
