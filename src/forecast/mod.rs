//! Empirical forecasting of household energy consumption and generation.
//!
//! The model is deliberately simple: every observed per-bin energy amount is
//! kept as a sample in an empirical distribution, one distribution per
//! time-of-week bin, and predictions are random draws from those
//! distributions. Predictions are therefore stochastic by design — the
//! predictor is meant to be sampled, not to report an expectation.

/// Sorted sample store with order-statistic interpolated sampling.
pub mod distribution;
/// Weekly-binned stochastic energy forecaster.
pub mod energy;
/// Per-battery spare-power prediction.
pub mod spare;

pub use distribution::EmpiricalDistribution;
pub use energy::RandomForecast;
pub use spare::{BatteryState, GiveAllPredictor, PowerPredictor, Predictor, SparePowerPredictor};
