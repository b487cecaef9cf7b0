//! Core simulation types: configuration, tick inputs, and step records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDateTime};

/// Input attribute carrying household consumption (kW, >= 0).
pub const POWER_CONSUMPTION_KW: &str = "power_consumption_kw";
/// Input attribute carrying non-PV generation (kW, >= 0).
pub const POWER_GENERATION_KW: &str = "power_generation_kw";
/// Input attribute carrying rooftop-PV generation (kW, >= 0).
pub const POWER_GENERATION_PV_KW: &str = "power_generation_pv_kw";

/// Named power attributes for one entity in one tick.
///
/// Maps attribute name to the per-source contributions delivered by upstream
/// simulators; the receiving battery sums the contributions per attribute.
/// `BTreeMap` keeps iteration order deterministic across runs.
pub type AttrValues = BTreeMap<String, BTreeMap<String, f32>>;

/// Everything the external scheduler delivers for one tick.
#[derive(Debug, Clone, Default)]
pub struct StepInputs {
    /// Demand of the shared consumer pool the fleet supplies. Only
    /// [`POWER_CONSUMPTION_KW`] is legal here.
    pub consumers: AttrValues,
    /// Battery name to that battery's attribute readings. A battery absent
    /// from the map simply has no readings this tick.
    pub batteries: BTreeMap<String, AttrValues>,
}

impl StepInputs {
    /// Creates an empty input set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one source's contribution to a battery attribute.
    pub fn add_battery_reading(&mut self, battery: &str, attr: &str, source: &str, kw: f32) {
        self.batteries
            .entry(battery.to_string())
            .or_default()
            .entry(attr.to_string())
            .or_default()
            .insert(source.to_string(), kw);
    }

    /// Records one source's contribution to the shared consumer-pool demand.
    pub fn add_consumer_demand(&mut self, source: &str, kw: f32) {
        self.consumers
            .entry(POWER_CONSUMPTION_KW.to_string())
            .or_default()
            .insert(source.to_string(), kw);
    }
}

/// Fatal input error: the scheduler delivered an attribute name the battery
/// layer does not recognize, which signals a topology misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError {
    /// Entity the attribute was addressed to.
    pub entity: String,
    /// The unrecognized attribute name.
    pub attribute: String,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown input attribute \"{}\" for entity \"{}\"",
            self.attribute, self.entity
        )
    }
}

/// Summed per-tick power readings for one battery.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerReadings {
    /// Total consumption (kW).
    pub consumption_kw: f32,
    /// Total generation, PV included (kW).
    pub generation_kw: f32,
}

/// Sums an entity's attribute map into consumption/generation totals.
///
/// Both generation attributes accumulate into the same total. An attribute
/// name outside the known set is fatal.
pub fn sum_power_readings(entity: &str, attrs: &AttrValues) -> Result<PowerReadings, InputError> {
    let mut readings = PowerReadings::default();
    for (attr, sources) in attrs {
        let total: f32 = sources.values().sum();
        match attr.as_str() {
            POWER_CONSUMPTION_KW => readings.consumption_kw += total,
            POWER_GENERATION_KW | POWER_GENERATION_PV_KW => readings.generation_kw += total,
            _ => {
                return Err(InputError {
                    entity: entity.to_string(),
                    attribute: attr.clone(),
                });
            }
        }
    }
    Ok(readings)
}

/// Centralized simulation configuration.
///
/// All batteries and the engine reference this struct for timing parameters.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Absolute timestamp of step 0.
    pub start: NaiveDateTime,
    /// Duration of one step in seconds.
    pub step_seconds: u32,
    /// Number of days to simulate.
    pub days: usize,
    /// Master random seed for reproducibility.
    pub seed: u64,
    /// Forecast bin width; must divide 24 hours evenly.
    pub bin_width: Duration,
}

impl SimConfig {
    /// Creates a configuration with the default one-hour forecast bins.
    ///
    /// # Panics
    ///
    /// Panics if `step_seconds` is zero or does not divide one day evenly,
    /// or if `days` is zero.
    pub fn new(start: NaiveDateTime, step_seconds: u32, days: usize, seed: u64) -> Self {
        assert!(step_seconds > 0, "step_seconds must be > 0");
        assert!(
            86_400 % step_seconds == 0,
            "step_seconds must divide one day evenly"
        );
        assert!(days > 0, "days must be > 0");
        Self {
            start,
            step_seconds,
            days,
            seed,
            bin_width: Duration::hours(1),
        }
    }

    /// Replaces the forecast bin width.
    ///
    /// # Panics
    ///
    /// Panics if `bin_width` is not positive or does not divide 24 hours.
    pub fn with_bin_width(mut self, bin_width: Duration) -> Self {
        assert!(bin_width > Duration::zero(), "bin width must be positive");
        assert!(
            Duration::hours(24).num_seconds() % bin_width.num_seconds() == 0,
            "bin width must divide 24 hours evenly"
        );
        self.bin_width = bin_width;
        self
    }

    /// Number of steps per simulated day.
    pub fn steps_per_day(&self) -> usize {
        (86_400 / self.step_seconds) as usize
    }

    /// Total number of steps across all days.
    pub fn total_steps(&self) -> usize {
        self.steps_per_day() * self.days
    }

    /// Duration of one step in hours.
    pub fn dt_hours(&self) -> f32 {
        self.step_seconds as f32 / 3600.0
    }

    /// Absolute timestamp of step `t`.
    pub fn time_at(&self, t: usize) -> NaiveDateTime {
        self.start + Duration::seconds(t as i64 * self.step_seconds as i64)
    }
}

/// Kind marker for step records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryKind {
    /// Predicting, pool-sharing battery.
    Smart,
    /// Non-predicting floor-case battery.
    Simple,
}

impl BatteryKind {
    /// Short lowercase label for reports and CSV.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Smart => "smart",
            Self::Simple => "simple",
        }
    }
}

/// Complete record of one battery in one simulation step, captured after
/// the allocation phase.
#[derive(Debug, Clone)]
pub struct BatteryStepRecord {
    /// Battery name.
    pub name: String,
    /// Step index.
    pub timestep: usize,
    /// Absolute step timestamp.
    pub time: NaiveDateTime,
    /// Smart or simple.
    pub kind: BatteryKind,
    /// Stored energy after this step (kWh).
    pub current_charge_kwh: f32,
    /// `generation - consumption` this step (kW, signed).
    pub power_balance_kw: f32,
    /// Spare power predicted this step (kW, >= 0; 0 for simple batteries).
    pub power_to_spare_kw: f32,
    /// Power drawn from the public grid (kW, >= 0).
    pub import_from_grid_kw: f32,
    /// Power exported to the public grid (kW, >= 0).
    pub export_to_grid_kw: f32,
    /// Power routed directly to the household load (kW, >= 0).
    pub feed_in_to_home_kw: f32,
    /// Charge change expressed as power (kW, signed).
    pub time_step_delta_kw: f32,
    /// Fleet-wide spare power this step (kW).
    pub total_spare_power_kw: f32,
    /// Shared consumer-pool demand this step (kW).
    pub consumer_demand_kw: f32,
    /// Whether the step's energy demand was met without the public grid.
    pub energy_demand_met: bool,
}

impl fmt::Display for BatteryStepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>5} {} | {:<10} ({}) charge={:>7.3} kWh  balance={:>7.3} kW  \
             spare={:>6.3} kW | imp={:>6.3}  exp={:>6.3}  home={:>6.3} kW | met={}",
            self.timestep,
            self.time.format("%Y-%m-%d %H:%M"),
            self.name,
            self.kind.as_str(),
            self.current_charge_kwh,
            self.power_balance_kw,
            self.power_to_spare_kw,
            self.import_from_grid_kw,
            self.export_to_grid_kw,
            self.feed_in_to_home_kw,
            self.energy_demand_met,
        )
    }
}
