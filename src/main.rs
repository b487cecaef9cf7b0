//! Prosumer fleet simulator entry point — CLI wiring and config-driven
//! engine construction.

use std::path::Path;
use std::process;

use chrono::{Duration, NaiveDateTime};

use prosumer_sim::config::ScenarioConfig;
use prosumer_sim::devices::{HouseholdLoad, PowerProfile, SimpleBattery, SmartBattery, SolarPv};
use prosumer_sim::forecast::{GiveAllPredictor, Predictor, SparePowerPredictor};
use prosumer_sim::io::export::export_csv;
use prosumer_sim::sim::engine::Engine;
use prosumer_sim::sim::kpi::KpiReport;
use prosumer_sim::sim::types::{
    POWER_CONSUMPTION_KW, POWER_GENERATION_PV_KW, SimConfig, StepInputs,
};

/// Seed offset for household load RNGs to avoid correlation with PV noise.
const HOUSEHOLD_SEED_OFFSET: u64 = 11;
/// Seed offset for PV profile RNGs.
const PV_SEED_OFFSET: u64 = 23;
/// Seed offset for the consumer-pool demand RNG.
const CONSUMER_SEED_OFFSET: u64 = 31;
/// Seed offset for the spare-power predictor RNGs.
const PREDICTOR_SEED_OFFSET: u64 = 57;
/// Per-battery seed stride so profile streams stay independent.
const SEED_STRIDE: u64 = 101;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    seed_override: Option<u64>,
    telemetry_out: Option<String>,
}

fn print_help() {
    eprintln!("prosumer-sim — Household prosumer battery-fleet simulator");
    eprintln!();
    eprintln!("Usage: prosumer-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline)");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --telemetry-out <path>   Export step records to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        seed_override: None,
        telemetry_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --seed requires a u64 argument");
                    process::exit(1);
                }
                if let Ok(s) = args[i].parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{}\" is not a valid u64", args[i]);
                    process::exit(1);
                }
            }
            "--telemetry-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --telemetry-out requires a path argument");
                    process::exit(1);
                }
                cli.telemetry_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

/// Where a profile's reading is routed each tick.
enum FeedTarget {
    /// A battery attribute.
    Battery { name: String, attr: &'static str },
    /// The shared consumer-pool demand.
    ConsumerPool,
}

/// One upstream data source wired to the fleet: a profile plus its routing.
struct Feed {
    target: FeedTarget,
    source: &'static str,
    profile: Box<dyn PowerProfile>,
}

/// Polls every feed once and assembles the tick's input set.
fn build_step_inputs(feeds: &mut [Feed], time: NaiveDateTime) -> StepInputs {
    let mut inputs = StepInputs::new();
    for feed in feeds {
        let kw = feed.profile.power_kw(time);
        match &feed.target {
            FeedTarget::Battery { name, attr } => {
                inputs.add_battery_reading(name, attr, feed.source, kw);
            }
            FeedTarget::ConsumerPool => inputs.add_consumer_demand(feed.source, kw),
        }
    }
    inputs
}

/// Builds the engine and the profile feeds from a validated scenario.
fn build_scenario(cfg: &ScenarioConfig, start: NaiveDateTime) -> (Engine, Vec<Feed>) {
    let s = &cfg.simulation;
    let sim_config = SimConfig::new(start, s.step_seconds, s.days, s.seed)
        .with_bin_width(Duration::minutes(s.bin_width_minutes as i64));

    let mut smart = Vec::new();
    let mut simple = Vec::new();
    let mut feeds = Vec::new();

    for (index, battery) in cfg.batteries.iter().enumerate() {
        let battery_seed = s.seed.wrapping_add(index as u64 * SEED_STRIDE);

        if battery.smart {
            let predictor = if battery.predictor == "give_all" {
                Predictor::GiveAll(GiveAllPredictor)
            } else {
                Predictor::SparePower(SparePowerPredictor::with_bin_width(
                    sim_config.bin_width,
                    battery_seed.wrapping_add(PREDICTOR_SEED_OFFSET),
                ))
            };
            smart.push(SmartBattery::new(
                battery.name.clone(),
                battery.capacity_kwh,
                battery.initial_charge_kwh,
                s.step_seconds,
                predictor,
            ));
        } else {
            simple.push(SimpleBattery::new(
                battery.name.clone(),
                battery.capacity_kwh,
                battery.initial_charge_kwh,
                s.step_seconds,
            ));
        }

        let h = &cfg.household;
        feeds.push(Feed {
            target: FeedTarget::Battery {
                name: battery.name.clone(),
                attr: POWER_CONSUMPTION_KW,
            },
            source: "household",
            profile: Box::new(HouseholdLoad::new(
                h.base_kw,
                h.amp_kw,
                h.phase_rad,
                h.noise_std,
                battery_seed.wrapping_add(HOUSEHOLD_SEED_OFFSET),
            )),
        });

        let sol = &cfg.solar;
        feeds.push(Feed {
            target: FeedTarget::Battery {
                name: battery.name.clone(),
                attr: POWER_GENERATION_PV_KW,
            },
            source: "pv",
            profile: Box::new(SolarPv::new(
                sol.kw_peak,
                sol.sunrise_hour,
                sol.sunset_hour,
                sol.noise_std,
                battery_seed.wrapping_add(PV_SEED_OFFSET),
            )),
        });
    }

    let pool = &cfg.consumers;
    feeds.push(Feed {
        target: FeedTarget::ConsumerPool,
        source: "district",
        profile: Box::new(HouseholdLoad::new(
            pool.base_kw,
            pool.amp_kw,
            pool.phase_rad,
            pool.noise_std,
            s.seed.wrapping_add(CONSUMER_SEED_OFFSET),
        )),
    });

    (Engine::new(sim_config, smart, simple), feeds)
}

fn main() {
    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then baseline
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let start = match scenario.start() {
        Ok(start) => start,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let (mut engine, mut feeds) = build_scenario(&scenario, start);

    let records = match engine.run(|_, time| build_step_inputs(&mut feeds, time)) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    for r in &records {
        println!("{r}");
    }

    let kpi = KpiReport::from_records(
        &records,
        engine.config().dt_hours(),
        engine.fleet_capacity_kwh(),
    );
    println!("\n{kpi}");

    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
}
