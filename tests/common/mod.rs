//! Shared builders for the integration tests.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use prosumer_sim::config::ScenarioConfig;
use prosumer_sim::devices::{SimpleBattery, SmartBattery};
use prosumer_sim::forecast::{GiveAllPredictor, Predictor, SparePowerPredictor};
use prosumer_sim::sim::engine::Engine;
use prosumer_sim::sim::types::{
    POWER_CONSUMPTION_KW, POWER_GENERATION_PV_KW, SimConfig, StepInputs,
};

/// Friday 2016-07-01 00:00, the baseline preset's start.
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 7, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start")
}

/// Hourly steps over `days` days.
pub fn config(days: usize) -> SimConfig {
    SimConfig::new(start(), 3600, days, 42)
}

pub fn give_all_battery(name: &str, capacity_kwh: f32, charge_kwh: f32) -> SmartBattery {
    SmartBattery::new(name, capacity_kwh, charge_kwh, 3600, Predictor::GiveAll(GiveAllPredictor))
}

pub fn spare_power_battery(name: &str, capacity_kwh: f32, charge_kwh: f32, seed: u64) -> SmartBattery {
    SmartBattery::new(
        name,
        capacity_kwh,
        charge_kwh,
        3600,
        Predictor::SparePower(SparePowerPredictor::new(seed)),
    )
}

/// Two forecast-driven smart batteries plus one simple battery.
pub fn default_fleet_engine(days: usize) -> Engine {
    let smart = vec![
        spare_power_battery("prosumer0", 10.0, 5.0, 57),
        spare_power_battery("prosumer1", 13.5, 4.0, 158),
    ];
    let simple = vec![SimpleBattery::new("household0", 10.0, 5.0, 3600)];
    Engine::new(config(days), smart, simple)
}

/// Noise-free daily household/PV pattern for the named batteries plus a
/// flat 1 kW consumer-pool demand.
///
/// Consumption is a constant 0.5 kW; PV follows a half-sine between 06:00
/// and 20:00 peaking at 4 kW, so the balance is negative at night and
/// positive around midday.
pub fn deterministic_inputs(battery_names: &[&str], time: NaiveDateTime) -> StepInputs {
    let hour = time.num_seconds_from_midnight() as f32 / 3600.0;
    let pv_kw = if (6.0..20.0).contains(&hour) {
        4.0 * ((hour - 6.0) / 14.0 * std::f32::consts::PI).sin()
    } else {
        0.0
    };

    let mut inputs = StepInputs::new();
    for name in battery_names {
        inputs.add_battery_reading(name, POWER_CONSUMPTION_KW, "household", 0.5);
        inputs.add_battery_reading(name, POWER_GENERATION_PV_KW, "pv", pv_kw);
    }
    inputs.add_consumer_demand("district", 1.0);
    inputs
}

/// Validated baseline scenario configuration.
pub fn baseline_scenario() -> ScenarioConfig {
    let cfg = ScenarioConfig::baseline();
    assert!(cfg.validate().is_empty());
    cfg
}
