//! TOML-based scenario configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

/// Timestamp format accepted for `simulation.start`.
pub const START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from TOML
/// with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Per-battery household load profile parameters.
    #[serde(default)]
    pub household: ProfileConfig,
    /// Per-battery rooftop PV parameters.
    #[serde(default)]
    pub solar: SolarConfig,
    /// Shared consumer-pool demand profile parameters.
    #[serde(default = "ProfileConfig::consumer_pool")]
    pub consumers: ProfileConfig,
    /// Battery fleet definition.
    #[serde(default = "default_batteries")]
    pub batteries: Vec<BatteryConfig>,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Absolute start timestamp, `YYYY-MM-DDTHH:MM:SS`.
    pub start: String,
    /// Step duration in seconds (must divide one day evenly).
    pub step_seconds: u32,
    /// Number of days to simulate (must be > 0).
    pub days: usize,
    /// Master random seed.
    pub seed: u64,
    /// Forecast bin width in minutes (must divide 24 hours evenly).
    pub bin_width_minutes: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: "2016-07-01T00:00:00".to_string(),
            step_seconds: 900,
            days: 7,
            seed: 42,
            bin_width_minutes: 60,
        }
    }
}

/// Sinusoid-plus-noise load profile parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Baseline power (kW).
    pub base_kw: f32,
    /// Sinusoidal amplitude (kW).
    pub amp_kw: f32,
    /// Phase offset (radians).
    pub phase_rad: f32,
    /// Gaussian noise standard deviation (kW).
    pub noise_std: f32,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            base_kw: 0.5,
            amp_kw: 0.3,
            phase_rad: 1.2,
            noise_std: 0.05,
        }
    }
}

impl ProfileConfig {
    /// Default demand profile of the shared consumer pool.
    pub fn consumer_pool() -> Self {
        Self {
            base_kw: 1.0,
            amp_kw: 0.5,
            phase_rad: 0.0,
            noise_std: 0.02,
        }
    }
}

/// Rooftop PV parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    /// Peak generation (kW).
    pub kw_peak: f32,
    /// Hour of day generation starts (inclusive).
    pub sunrise_hour: f32,
    /// Hour of day generation ends (exclusive).
    pub sunset_hour: f32,
    /// Noise standard deviation as a fraction of output.
    pub noise_std: f32,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            kw_peak: 4.0,
            sunrise_hour: 6.0,
            sunset_hour: 20.0,
            noise_std: 0.05,
        }
    }
}

/// One battery in the fleet.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatteryConfig {
    /// Unique battery name.
    pub name: String,
    /// Total energy capacity (kWh).
    pub capacity_kwh: f32,
    /// Initial charge (kWh, within `[0, capacity_kwh]`).
    pub initial_charge_kwh: f32,
    /// Smart (predicting, pool-sharing) or simple battery.
    #[serde(default = "default_true")]
    pub smart: bool,
    /// Predictor for smart batteries: `"spare_power"` or `"give_all"`.
    #[serde(default = "default_predictor")]
    pub predictor: String,
}

fn default_true() -> bool {
    true
}

fn default_predictor() -> String {
    "spare_power".to_string()
}

fn default_batteries() -> Vec<BatteryConfig> {
    vec![
        BatteryConfig {
            name: "prosumer0".to_string(),
            capacity_kwh: 10.0,
            initial_charge_kwh: 5.0,
            smart: true,
            predictor: "spare_power".to_string(),
        },
        BatteryConfig {
            name: "prosumer1".to_string(),
            capacity_kwh: 13.5,
            initial_charge_kwh: 4.0,
            smart: true,
            predictor: "spare_power".to_string(),
        },
        BatteryConfig {
            name: "household0".to_string(),
            capacity_kwh: 10.0,
            initial_charge_kwh: 5.0,
            smart: false,
            predictor: "spare_power".to_string(),
        },
    ]
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.step_seconds"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: two forecast-driven smart batteries
    /// plus one simple battery over a summer week.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            household: ProfileConfig::default(),
            solar: SolarConfig::default(),
            consumers: ProfileConfig::consumer_pool(),
            batteries: default_batteries(),
        }
    }

    /// Returns the give-all preset: the same fleet with the naive
    /// quarter-of-charge predictor on every smart battery.
    pub fn give_all() -> Self {
        let mut cfg = Self::baseline();
        for battery in &mut cfg.batteries {
            battery.predictor = "give_all".to_string();
        }
        cfg
    }

    /// Returns the no-solar preset: a winter-like week without PV, stressing
    /// the import path.
    pub fn no_solar() -> Self {
        Self {
            simulation: SimulationConfig {
                start: "2016-12-01T00:00:00".to_string(),
                ..SimulationConfig::default()
            },
            solar: SolarConfig {
                kw_peak: 0.0,
                ..SolarConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "give_all", "no_solar"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "give_all" => Ok(Self::give_all()),
            "no_solar" => Ok(Self::no_solar()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is
    /// invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown
    /// fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Parses the start timestamp.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the string does not match [`START_FORMAT`].
    pub fn start(&self) -> Result<NaiveDateTime, ConfigError> {
        NaiveDateTime::parse_from_str(&self.simulation.start, START_FORMAT).map_err(|e| {
            ConfigError {
                field: "simulation.start".to_string(),
                message: format!("expected {START_FORMAT}: {e}"),
            }
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.step_seconds == 0 {
            errors.push(ConfigError {
                field: "simulation.step_seconds".into(),
                message: "must be > 0".into(),
            });
        } else if 86_400 % s.step_seconds != 0 {
            errors.push(ConfigError {
                field: "simulation.step_seconds".into(),
                message: "must divide one day evenly".into(),
            });
        }
        if s.days == 0 {
            errors.push(ConfigError {
                field: "simulation.days".into(),
                message: "must be > 0".into(),
            });
        }
        if s.bin_width_minutes == 0 {
            errors.push(ConfigError {
                field: "simulation.bin_width_minutes".into(),
                message: "must be > 0".into(),
            });
        } else if (24 * 60) % s.bin_width_minutes != 0 {
            errors.push(ConfigError {
                field: "simulation.bin_width_minutes".into(),
                message: "must divide 24 hours evenly".into(),
            });
        }
        if let Err(e) = self.start() {
            errors.push(e);
        }

        let sol = &self.solar;
        if sol.sunrise_hour >= sol.sunset_hour {
            errors.push(ConfigError {
                field: "solar.sunrise_hour".into(),
                message: "must be < solar.sunset_hour".into(),
            });
        }
        if sol.sunset_hour > 24.0 {
            errors.push(ConfigError {
                field: "solar.sunset_hour".into(),
                message: "must be <= 24".into(),
            });
        }

        if self.batteries.is_empty() {
            errors.push(ConfigError {
                field: "batteries".into(),
                message: "at least one battery is required".into(),
            });
        }
        for (index, battery) in self.batteries.iter().enumerate() {
            let field = |name: &str| format!("batteries[{index}].{name}");
            if battery.capacity_kwh <= 0.0 {
                errors.push(ConfigError {
                    field: field("capacity_kwh"),
                    message: "must be > 0".into(),
                });
            }
            if battery.initial_charge_kwh < 0.0
                || battery.initial_charge_kwh > battery.capacity_kwh
            {
                errors.push(ConfigError {
                    field: field("initial_charge_kwh"),
                    message: "must be in [0, capacity_kwh]".into(),
                });
            }
            if battery.predictor != "spare_power" && battery.predictor != "give_all" {
                errors.push(ConfigError {
                    field: field("predictor"),
                    message: format!(
                        "must be \"spare_power\" or \"give_all\", got \"{}\"",
                        battery.predictor
                    ),
                });
            }
            if self.batteries[..index].iter().any(|b| b.name == battery.name) {
                errors.push(ConfigError {
                    field: field("name"),
                    message: format!("duplicate battery name \"{}\"", battery.name),
                });
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
start = "2017-01-02T00:00:00"
step_seconds = 3600
days = 2
seed = 99
bin_width_minutes = 30

[household]
base_kw = 0.8
amp_kw = 0.4
phase_rad = 0.0
noise_std = 0.1

[solar]
kw_peak = 6.0
sunrise_hour = 7.0
sunset_hour = 18.0
noise_std = 0.1

[[batteries]]
name = "a"
capacity_kwh = 12.0
initial_charge_kwh = 6.0

[[batteries]]
name = "b"
capacity_kwh = 8.0
initial_charge_kwh = 2.0
smart = false
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.step_seconds), Some(3600));
        assert_eq!(cfg.as_ref().map(|c| c.batteries.len()), Some(2));
        assert_eq!(cfg.as_ref().map(|c| c.batteries[1].smart), Some(false));
        // predictor defaulted
        assert_eq!(
            cfg.as_ref().map(|c| c.batteries[0].predictor.as_str()),
            Some("spare_power")
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
step_seconds = 900
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.seed), Some(99));
        assert_eq!(cfg.as_ref().map(|c| c.simulation.step_seconds), Some(900));
        assert_eq!(cfg.as_ref().map(|c| c.batteries.len()), Some(3));
    }

    #[test]
    fn validation_catches_non_dividing_step() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.step_seconds = 7000;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.step_seconds"));
    }

    #[test]
    fn validation_catches_non_dividing_bin_width() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.bin_width_minutes = 25;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "simulation.bin_width_minutes")
        );
    }

    #[test]
    fn validation_catches_bad_start() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.start = "01.07.2016".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.start"));
    }

    #[test]
    fn validation_catches_charge_above_capacity() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.batteries[0].initial_charge_kwh = 99.0;
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "batteries[0].initial_charge_kwh")
        );
    }

    #[test]
    fn validation_catches_bad_predictor() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.batteries[0].predictor = "oracle".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "batteries[0].predictor"));
    }

    #[test]
    fn validation_catches_duplicate_names() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.batteries[1].name = cfg.batteries[0].name.clone();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "batteries[1].name"));
    }

    #[test]
    fn give_all_preset_switches_predictor() {
        let cfg = ScenarioConfig::give_all();
        assert!(cfg.batteries.iter().all(|b| b.predictor == "give_all"));
    }

    #[test]
    fn no_solar_preset_has_zero_peak() {
        let cfg = ScenarioConfig::no_solar();
        assert_eq!(cfg.solar.kw_peak, 0.0);
    }
}
