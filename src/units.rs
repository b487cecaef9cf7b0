//! Power/energy conversions shared by batteries, predictors, and reports.

/// Converts a constant power draw in kW held for `seconds` into energy in kWh.
pub fn power_to_energy_kwh(power_kw: f32, seconds: f32) -> f32 {
    power_kw * (seconds / 3600.0)
}

/// Converts an energy amount in kWh spread evenly over `seconds` into power in kW.
///
/// Returns 0.0 for a non-positive duration so callers never divide by zero.
pub fn energy_to_power_kw(energy_kwh: f32, seconds: f32) -> f32 {
    if seconds <= 0.0 {
        return 0.0;
    }
    energy_kwh * (3600.0 / seconds)
}
