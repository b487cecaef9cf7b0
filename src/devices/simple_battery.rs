use crate::sim::types::{AttrValues, InputError, sum_power_readings};
use crate::units::{energy_to_power_kw, power_to_energy_kwh};

/// A battery without prediction or fleet sharing.
///
/// Each tick the power balance charges or discharges the store directly;
/// overflow is exported to the public grid, a deficit beyond the stored
/// charge is imported from it. Serves as the floor case the smart fleet is
/// compared against.
#[derive(Debug, Clone)]
pub struct SimpleBattery {
    name: String,
    capacity_kwh: f32,
    charge_kwh: f32,
    step_seconds: u32,

    power_balance_kw: f32,
    import_from_grid_kw: f32,
    export_to_grid_kw: f32,
    feed_in_to_home_kw: f32,
    time_step_delta_kw: f32,
    energy_demand_met: bool,
}

impl SimpleBattery {
    /// Creates a battery.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is not positive, the initial charge is outside
    /// `[0, capacity]`, or the step duration is zero.
    pub fn new(
        name: impl Into<String>,
        capacity_kwh: f32,
        initial_charge_kwh: f32,
        step_seconds: u32,
    ) -> Self {
        assert!(capacity_kwh > 0.0);
        assert!((0.0..=capacity_kwh).contains(&initial_charge_kwh));
        assert!(step_seconds > 0);

        Self {
            name: name.into(),
            capacity_kwh,
            charge_kwh: initial_charge_kwh,
            step_seconds,
            power_balance_kw: 0.0,
            import_from_grid_kw: 0.0,
            export_to_grid_kw: 0.0,
            feed_in_to_home_kw: 0.0,
            time_step_delta_kw: 0.0,
            energy_demand_met: true,
        }
    }

    /// Applies one tick's readings.
    ///
    /// # Errors
    ///
    /// Fails on an unrecognized attribute name.
    pub fn step(&mut self, attrs: &AttrValues) -> Result<(), InputError> {
        let readings = sum_power_readings(&self.name, attrs)?;
        self.power_balance_kw = readings.generation_kw - readings.consumption_kw;

        let dt_seconds = self.step_seconds as f32;
        let charge_before_kwh = self.charge_kwh;
        let balance_kwh = power_to_energy_kwh(self.power_balance_kw, dt_seconds);

        let possible_charge_kwh = charge_before_kwh + balance_kwh;
        self.charge_kwh = possible_charge_kwh.max(0.0).min(self.capacity_kwh);

        self.export_to_grid_kw =
            energy_to_power_kw((possible_charge_kwh - self.capacity_kwh).max(0.0), dt_seconds);
        self.import_from_grid_kw =
            energy_to_power_kw((-possible_charge_kwh).max(0.0), dt_seconds);

        self.time_step_delta_kw =
            energy_to_power_kw(self.charge_kwh - charge_before_kwh, dt_seconds);
        self.feed_in_to_home_kw = self.time_step_delta_kw.min(0.0).abs();

        self.energy_demand_met = balance_kwh > 0.0 || balance_kwh.abs() <= charge_before_kwh;
        Ok(())
    }

    /// Battery name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total capacity (kWh).
    pub fn capacity_kwh(&self) -> f32 {
        self.capacity_kwh
    }

    /// Stored energy (kWh).
    pub fn current_charge_kwh(&self) -> f32 {
        self.charge_kwh
    }

    /// This step's power balance (kW, signed).
    pub fn power_balance_kw(&self) -> f32 {
        self.power_balance_kw
    }

    /// Power drawn from the public grid this step (kW, >= 0).
    pub fn import_from_grid_kw(&self) -> f32 {
        self.import_from_grid_kw
    }

    /// Power exported to the public grid this step (kW, >= 0).
    pub fn export_to_grid_kw(&self) -> f32 {
        self.export_to_grid_kw
    }

    /// Power routed directly to the household this step (kW, >= 0).
    pub fn feed_in_to_home_kw(&self) -> f32 {
        self.feed_in_to_home_kw
    }

    /// Charge change of this step expressed as power (kW, signed).
    pub fn time_step_delta_kw(&self) -> f32 {
        self.time_step_delta_kw
    }

    /// Whether this step's demand was covered without the public grid.
    pub fn energy_demand_met(&self) -> bool {
        self.energy_demand_met
    }
}
