use chrono::NaiveDateTime;

use crate::forecast::{BatteryState, PowerPredictor, Predictor};
use crate::sim::allocation::AllocationContext;
use crate::sim::types::{AttrValues, InputError, sum_power_readings};
use crate::units::{energy_to_power_kw, power_to_energy_kwh};

/// A prosumer battery that predicts its spare power and shares it with a
/// pool of consumers.
///
/// Each tick runs in two phases, coordinated by the engine across the whole
/// fleet:
///
/// 1. [`calculate_energy_needs`](Self::calculate_energy_needs) ingests the
///    tick's power readings, asks the predictor for spare power, and
///    contributes it to the fleet pool.
/// 2. [`calculate_power_distribution`](Self::calculate_power_distribution)
///    applies the charge update, the proportional consumer export, and the
///    floor/capacity clamps, once the pool totals are final.
///
/// `0 <= current_charge_kwh <= capacity_kwh` holds after every phase 2.
#[derive(Debug, Clone)]
pub struct SmartBattery {
    name: String,
    capacity_kwh: f32,
    charge_kwh: f32,
    step_seconds: u32,
    predictor: Predictor,

    power_consumption_kw: f32,
    power_generation_kw: f32,
    power_balance_kw: f32,
    spare_power_kw: f32,

    import_from_grid_kw: f32,
    export_to_grid_kw: f32,
    feed_in_to_home_kw: f32,
    time_step_delta_kw: f32,
}

impl SmartBattery {
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
        predictor: Predictor,
    ) -> Self {
        assert!(capacity_kwh > 0.0);
        assert!((0.0..=capacity_kwh).contains(&initial_charge_kwh));
        assert!(step_seconds > 0);

        Self {
            name: name.into(),
            capacity_kwh,
            charge_kwh: initial_charge_kwh,
            step_seconds,
            predictor,
            power_consumption_kw: 0.0,
            power_generation_kw: 0.0,
            power_balance_kw: 0.0,
            spare_power_kw: 0.0,
            import_from_grid_kw: 0.0,
            export_to_grid_kw: 0.0,
            feed_in_to_home_kw: 0.0,
            time_step_delta_kw: 0.0,
        }
    }

    /// Read-only snapshot handed to the predictor.
    fn state(&self) -> BatteryState {
        BatteryState {
            capacity_kwh: self.capacity_kwh,
            charge_kwh: self.charge_kwh,
            power_consumption_kw: self.power_consumption_kw,
            power_generation_kw: self.power_generation_kw,
            power_balance_kw: self.power_balance_kw,
            step_seconds: self.step_seconds,
        }
    }

    /// Phase 1: ingests this tick's readings and contributes the predicted
    /// spare power to the fleet pool.
    ///
    /// # Errors
    ///
    /// Fails on an unrecognized attribute name (topology misconfiguration).
    pub fn calculate_energy_needs(
        &mut self,
        time: NaiveDateTime,
        attrs: &AttrValues,
        allocation: &mut AllocationContext,
    ) -> Result<(), InputError> {
        let readings = sum_power_readings(&self.name, attrs)?;
        self.power_consumption_kw = readings.consumption_kw;
        self.power_generation_kw = readings.generation_kw;
        self.power_balance_kw = readings.generation_kw - readings.consumption_kw;

        let state = self.state();
        self.spare_power_kw = self.predictor.predict_spare_power_kw(time, &state);
        allocation.add_spare_power(self.spare_power_kw);
        Ok(())
    }

    /// Phase 2: applies the charge update and the pool allocation.
    ///
    /// Must run after every battery in the fleet finished phase 1 for this
    /// tick, so the pool totals in `allocation` are complete.
    pub fn calculate_power_distribution(&mut self, allocation: &AllocationContext) {
        let mut consumer_share_kw = allocation.consumer_share_kw(self.spare_power_kw);
        let dt_seconds = self.step_seconds as f32;
        let charge_before_kwh = self.charge_kwh;

        // Charge update from the own balance; a deficit is drawn from the
        // public grid and the charge floors at zero.
        let possible_charge_kwh =
            self.charge_kwh + power_to_energy_kwh(self.power_balance_kw, dt_seconds);
        if possible_charge_kwh < 0.0 {
            self.import_from_grid_kw = energy_to_power_kw(-possible_charge_kwh, dt_seconds);
            self.charge_kwh = 0.0;
        } else {
            self.import_from_grid_kw = 0.0;
            self.charge_kwh = possible_charge_kwh;
        }

        // Export the allocated consumer share, but only when the stored
        // charge actually covers it; a shortfall drops the export entirely
        // for this tick.
        let energy_for_consumers_kwh = power_to_energy_kwh(consumer_share_kw, dt_seconds);
        if energy_for_consumers_kwh < self.charge_kwh {
            self.charge_kwh -= energy_for_consumers_kwh;
            self.export_to_grid_kw = consumer_share_kw;
        } else {
            self.export_to_grid_kw = 0.0;
            consumer_share_kw = 0.0;
        }

        // Overflow beyond capacity leaves as additional export.
        if self.charge_kwh > self.capacity_kwh {
            let excess_kwh = self.charge_kwh - self.capacity_kwh;
            self.charge_kwh = self.capacity_kwh;
            self.export_to_grid_kw += energy_to_power_kw(excess_kwh, dt_seconds);
        }

        self.time_step_delta_kw =
            energy_to_power_kw(self.charge_kwh - charge_before_kwh, dt_seconds);

        // Power that reached the household load directly, as the residual of
        // the charge delta and the consumer export.
        self.feed_in_to_home_kw = (self.time_step_delta_kw + consumer_share_kw).min(0.0).abs();
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

    /// This step's predicted spare power (kW, >= 0).
    pub fn power_to_spare_kw(&self) -> f32 {
        self.spare_power_kw
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
}
