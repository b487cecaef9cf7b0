//! Fleet engine orchestrating the two-phase battery step per tick.

use crate::devices::{SimpleBattery, SmartBattery};

use super::allocation::AllocationContext;
use super::clock::Clock;
use super::types::{
    AttrValues, BatteryKind, BatteryStepRecord, InputError, POWER_CONSUMPTION_KW, SimConfig,
    StepInputs,
};

/// Simulation engine owning the battery fleet and the per-tick allocation
/// context.
///
/// Each tick proceeds in a fixed order: the allocation context is reset with
/// this tick's consumer demand, every smart battery runs its demand/predict
/// phase, then every smart battery runs its distribution phase against the
/// completed pool totals, then the simple batteries step. This ordering is a
/// hard precondition of the allocation math, not an optimization.
pub struct Engine {
    config: SimConfig,
    smart: Vec<SmartBattery>,
    simple: Vec<SimpleBattery>,
    allocation: AllocationContext,
}

impl Engine {
    /// Creates an engine over the given fleet.
    pub fn new(config: SimConfig, smart: Vec<SmartBattery>, simple: Vec<SimpleBattery>) -> Self {
        Self {
            config,
            smart,
            simple,
            allocation: AllocationContext::new(),
        }
    }

    /// Executes one simulation tick and returns one record per battery.
    ///
    /// # Arguments
    ///
    /// * `t` - Step index, mapped to a timestamp via the configuration
    /// * `inputs` - This tick's scheduler-delivered readings
    ///
    /// # Errors
    ///
    /// Fails on an unrecognized input attribute name; the tick is then
    /// partially applied and the simulation should be aborted.
    pub fn step(
        &mut self,
        t: usize,
        inputs: &StepInputs,
    ) -> Result<Vec<BatteryStepRecord>, InputError> {
        let time = self.config.time_at(t);
        let empty = AttrValues::new();

        let demand_kw = consumer_demand_kw(&inputs.consumers)?;
        self.allocation.begin_step(demand_kw);

        // Phase 1: balances and spare-power offers for the whole fleet.
        for battery in &mut self.smart {
            let attrs = inputs.batteries.get(battery.name()).unwrap_or(&empty);
            battery.calculate_energy_needs(time, attrs, &mut self.allocation)?;
        }

        // Phase 2: distribution against the completed pool totals.
        for battery in &mut self.smart {
            battery.calculate_power_distribution(&self.allocation);
        }

        for battery in &mut self.simple {
            let attrs = inputs.batteries.get(battery.name()).unwrap_or(&empty);
            battery.step(attrs)?;
        }

        let mut records = Vec::with_capacity(self.smart.len() + self.simple.len());
        for battery in &self.smart {
            records.push(BatteryStepRecord {
                name: battery.name().to_string(),
                timestep: t,
                time,
                kind: BatteryKind::Smart,
                current_charge_kwh: battery.current_charge_kwh(),
                power_balance_kw: battery.power_balance_kw(),
                power_to_spare_kw: battery.power_to_spare_kw(),
                import_from_grid_kw: battery.import_from_grid_kw(),
                export_to_grid_kw: battery.export_to_grid_kw(),
                feed_in_to_home_kw: battery.feed_in_to_home_kw(),
                time_step_delta_kw: battery.time_step_delta_kw(),
                total_spare_power_kw: self.allocation.total_spare_power_kw(),
                consumer_demand_kw: self.allocation.consumer_demand_kw(),
                energy_demand_met: battery.import_from_grid_kw() == 0.0,
            });
        }
        for battery in &self.simple {
            records.push(BatteryStepRecord {
                name: battery.name().to_string(),
                timestep: t,
                time,
                kind: BatteryKind::Simple,
                current_charge_kwh: battery.current_charge_kwh(),
                power_balance_kw: battery.power_balance_kw(),
                power_to_spare_kw: 0.0,
                import_from_grid_kw: battery.import_from_grid_kw(),
                export_to_grid_kw: battery.export_to_grid_kw(),
                feed_in_to_home_kw: battery.feed_in_to_home_kw(),
                time_step_delta_kw: battery.time_step_delta_kw(),
                total_spare_power_kw: self.allocation.total_spare_power_kw(),
                consumer_demand_kw: self.allocation.consumer_demand_kw(),
                energy_demand_met: battery.energy_demand_met(),
            });
        }
        Ok(records)
    }

    /// Runs all configured steps, asking `inputs_for` for each tick's
    /// readings, and returns the flattened record stream.
    ///
    /// # Errors
    ///
    /// Propagates the first input error and stops.
    pub fn run(
        &mut self,
        mut inputs_for: impl FnMut(usize, chrono::NaiveDateTime) -> StepInputs,
    ) -> Result<Vec<BatteryStepRecord>, InputError> {
        let total = self.config.total_steps();
        let mut records = Vec::with_capacity(total * (self.smart.len() + self.simple.len()));
        let mut clock = Clock::for_config(&self.config);
        while let Some((t, time)) = clock.tick() {
            let inputs = inputs_for(t, time);
            records.extend(self.step(t, &inputs)?);
        }
        Ok(records)
    }

    /// Returns the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns the smart batteries (for capacity/charge queries).
    pub fn smart_batteries(&self) -> &[SmartBattery] {
        &self.smart
    }

    /// Returns the simple batteries.
    pub fn simple_batteries(&self) -> &[SimpleBattery] {
        &self.simple
    }

    /// Summed capacity of every battery in the fleet (kWh).
    pub fn fleet_capacity_kwh(&self) -> f32 {
        let smart: f32 = self.smart.iter().map(SmartBattery::capacity_kwh).sum();
        let simple: f32 = self.simple.iter().map(SimpleBattery::capacity_kwh).sum();
        smart + simple
    }
}

/// Sums the consumer-pool demand; only consumption may be addressed to it.
fn consumer_demand_kw(attrs: &AttrValues) -> Result<f32, InputError> {
    let mut demand_kw = 0.0;
    for (attr, sources) in attrs {
        if attr == POWER_CONSUMPTION_KW {
            demand_kw += sources.values().sum::<f32>();
        } else {
            return Err(InputError {
                entity: "consumers".to_string(),
                attribute: attr.clone(),
            });
        }
    }
    Ok(demand_kw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::{GiveAllPredictor, Predictor};
    use crate::sim::types::POWER_GENERATION_PV_KW;
    use chrono::NaiveDate;

    fn config() -> SimConfig {
        let start = NaiveDate::from_ymd_opt(2016, 7, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid start");
        SimConfig::new(start, 3600, 1, 42)
    }

    fn give_all(name: &str, capacity: f32, charge: f32) -> SmartBattery {
        SmartBattery::new(name, capacity, charge, 3600, Predictor::GiveAll(GiveAllPredictor))
    }

    #[test]
    fn proportional_allocation_across_fleet() {
        // Charges 300 / 100 kWh with the quarter-of-charge predictor over a
        // 1 h step offer 75 kW and 25 kW; 60 kW of demand splits 45 / 15.
        let smart = vec![
            give_all("a", 1000.0, 300.0),
            give_all("b", 1000.0, 100.0),
        ];
        let mut engine = Engine::new(config(), smart, Vec::new());

        let mut inputs = StepInputs::new();
        inputs.add_consumer_demand("district", 60.0);
        let records = engine.step(0, &inputs).expect("clean inputs");

        assert_eq!(records.len(), 2);
        assert!((records[0].power_to_spare_kw - 75.0).abs() < 1e-3);
        assert!((records[1].power_to_spare_kw - 25.0).abs() < 1e-3);
        assert!((records[0].total_spare_power_kw - 100.0).abs() < 1e-3);
        assert!((records[0].export_to_grid_kw - 45.0).abs() < 1e-3);
        assert!((records[1].export_to_grid_kw - 15.0).abs() < 1e-3);
        // Exported energy left the stores.
        assert!((records[0].current_charge_kwh - 255.0).abs() < 1e-2);
        assert!((records[1].current_charge_kwh - 85.0).abs() < 1e-2);
    }

    #[test]
    fn allocation_context_resets_between_ticks() {
        let mut engine = Engine::new(config(), vec![give_all("a", 100.0, 40.0)], Vec::new());

        let mut first = StepInputs::new();
        first.add_consumer_demand("district", 5.0);
        let records = engine.step(0, &first).expect("clean inputs");
        assert!(records[0].export_to_grid_kw > 0.0);

        // No demand on the second tick: nothing may carry over.
        let records = engine.step(1, &StepInputs::new()).expect("clean inputs");
        assert_eq!(records[0].consumer_demand_kw, 0.0);
        assert_eq!(records[0].export_to_grid_kw, 0.0);
    }

    #[test]
    fn missing_battery_entity_means_idle_readings() {
        let mut engine = Engine::new(
            config(),
            vec![give_all("a", 100.0, 40.0)],
            vec![SimpleBattery::new("s", 10.0, 5.0, 3600)],
        );
        let records = engine.step(0, &StepInputs::new()).expect("clean inputs");
        assert_eq!(records[0].power_balance_kw, 0.0);
        assert_eq!(records[1].power_balance_kw, 0.0);
        assert_eq!(records[1].current_charge_kwh, 5.0);
    }

    #[test]
    fn unknown_consumer_attribute_fails() {
        let mut engine = Engine::new(config(), Vec::new(), Vec::new());
        let mut inputs = StepInputs::new();
        inputs
            .consumers
            .entry(POWER_GENERATION_PV_KW.to_string())
            .or_default()
            .insert("pv".to_string(), 1.0);
        let err = engine.step(0, &inputs).unwrap_err();
        assert_eq!(err.entity, "consumers");
    }

    #[test]
    fn run_produces_records_for_every_battery_and_step() {
        let mut engine = Engine::new(
            config(),
            vec![give_all("a", 100.0, 40.0)],
            vec![SimpleBattery::new("s", 10.0, 5.0, 3600)],
        );
        let records = engine.run(|_, _| StepInputs::new()).expect("clean inputs");
        assert_eq!(records.len(), 24 * 2);
    }
}
