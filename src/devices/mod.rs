//! Device components: batteries and synthetic household profiles.

/// Sinusoidal household load profile.
pub mod household;
/// Non-predicting floor-case battery.
pub mod simple_battery;
/// Predicting, pool-sharing battery.
pub mod smart_battery;
/// Rooftop solar PV generation profile.
pub mod solar;
pub mod types;

// Re-export the main types for convenience
pub use household::HouseholdLoad;
pub use simple_battery::SimpleBattery;
pub use smart_battery::SmartBattery;
pub use solar::SolarPv;
pub use types::PowerProfile;
