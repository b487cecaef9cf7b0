//! Post-hoc KPI computation from the simulation record stream.

use std::fmt;

use super::types::{BatteryKind, BatteryStepRecord};

/// Aggregate key performance indicators derived from a complete run.
///
/// Computed post-hoc from the record stream to keep step data and reported
/// metrics consistent.
#[derive(Debug, Clone)]
pub struct KpiReport {
    /// Total energy imported from the public grid (kWh).
    pub total_import_kwh: f32,
    /// Total energy exported to the public grid (kWh).
    pub total_export_kwh: f32,
    /// Total energy fed directly into the households (kWh).
    pub total_feed_in_kwh: f32,
    /// Highest single-battery import power observed (kW).
    pub peak_import_kw: f32,
    /// Highest single-battery export power observed (kW).
    pub peak_export_kw: f32,
    /// Total battery energy throughput (kWh, sum of |delta| * dt).
    pub battery_throughput_kwh: f32,
    /// Equivalent full cycles (throughput / 2 * fleet capacity).
    pub equivalent_full_cycles: f32,
    /// Percentage of battery-steps whose demand was met without the grid.
    pub demand_met_pct: f32,
    /// Number of smart-battery records.
    pub smart_record_count: usize,
}

impl KpiReport {
    /// Computes all KPIs from the complete record stream.
    ///
    /// # Arguments
    ///
    /// * `records` - Record stream of a complete run
    /// * `dt_hours` - Step duration in hours
    /// * `fleet_capacity_kwh` - Summed fleet capacity for cycle counting
    pub fn from_records(
        records: &[BatteryStepRecord],
        dt_hours: f32,
        fleet_capacity_kwh: f32,
    ) -> Self {
        if records.is_empty() {
            return Self {
                total_import_kwh: 0.0,
                total_export_kwh: 0.0,
                total_feed_in_kwh: 0.0,
                peak_import_kw: 0.0,
                peak_export_kw: 0.0,
                battery_throughput_kwh: 0.0,
                equivalent_full_cycles: 0.0,
                demand_met_pct: 0.0,
                smart_record_count: 0,
            };
        }

        let mut import_kwh = 0.0_f32;
        let mut export_kwh = 0.0_f32;
        let mut feed_in_kwh = 0.0_f32;
        let mut peak_import = 0.0_f32;
        let mut peak_export = 0.0_f32;
        let mut throughput_kwh = 0.0_f32;
        let mut met = 0_usize;
        let mut smart_count = 0_usize;

        for record in records {
            import_kwh += record.import_from_grid_kw * dt_hours;
            export_kwh += record.export_to_grid_kw * dt_hours;
            feed_in_kwh += record.feed_in_to_home_kw * dt_hours;
            peak_import = peak_import.max(record.import_from_grid_kw);
            peak_export = peak_export.max(record.export_to_grid_kw);
            throughput_kwh += record.time_step_delta_kw.abs() * dt_hours;
            if record.energy_demand_met {
                met += 1;
            }
            if record.kind == BatteryKind::Smart {
                smart_count += 1;
            }
        }

        let cycles = if fleet_capacity_kwh > 0.0 {
            throughput_kwh / (2.0 * fleet_capacity_kwh)
        } else {
            0.0
        };

        Self {
            total_import_kwh: import_kwh,
            total_export_kwh: export_kwh,
            total_feed_in_kwh: feed_in_kwh,
            peak_import_kw: peak_import,
            peak_export_kw: peak_export,
            battery_throughput_kwh: throughput_kwh,
            equivalent_full_cycles: cycles,
            demand_met_pct: 100.0 * met as f32 / records.len() as f32,
            smart_record_count: smart_count,
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Grid import:          {:.2} kWh", self.total_import_kwh)?;
        writeln!(f, "Grid export:          {:.2} kWh", self.total_export_kwh)?;
        writeln!(f, "Home feed-in:         {:.2} kWh", self.total_feed_in_kwh)?;
        writeln!(f, "Peak import:          {:.2} kW", self.peak_import_kw)?;
        writeln!(f, "Peak export:          {:.2} kW", self.peak_export_kw)?;
        writeln!(
            f,
            "Battery throughput:   {:.2} kWh ({:.2} equiv. cycles)",
            self.battery_throughput_kwh, self.equivalent_full_cycles
        )?;
        write!(f, "Demand met:           {:.1}%", self.demand_met_pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(import_kw: f32, export_kw: f32, delta_kw: f32, met: bool) -> BatteryStepRecord {
        BatteryStepRecord {
            name: "b".to_string(),
            timestep: 0,
            time: NaiveDate::from_ymd_opt(2016, 7, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("valid timestamp"),
            kind: BatteryKind::Smart,
            current_charge_kwh: 5.0,
            power_balance_kw: 0.0,
            power_to_spare_kw: 0.0,
            import_from_grid_kw: import_kw,
            export_to_grid_kw: export_kw,
            feed_in_to_home_kw: 0.0,
            time_step_delta_kw: delta_kw,
            total_spare_power_kw: 0.0,
            consumer_demand_kw: 0.0,
            energy_demand_met: met,
        }
    }

    #[test]
    fn totals_and_peaks() {
        let records = vec![
            record(2.0, 0.0, 2.0, false),
            record(0.0, 3.0, -3.0, true),
            record(1.0, 0.0, 1.0, true),
        ];
        let kpi = KpiReport::from_records(&records, 1.0, 10.0);
        assert!((kpi.total_import_kwh - 3.0).abs() < 1e-5);
        assert!((kpi.total_export_kwh - 3.0).abs() < 1e-5);
        assert_eq!(kpi.peak_import_kw, 2.0);
        assert_eq!(kpi.peak_export_kw, 3.0);
        // throughput = 2 + 3 + 1 = 6 kWh, cycles = 6 / 20
        assert!((kpi.battery_throughput_kwh - 6.0).abs() < 1e-5);
        assert!((kpi.equivalent_full_cycles - 0.3).abs() < 1e-5);
    }

    #[test]
    fn demand_met_percentage() {
        let records = vec![
            record(0.0, 0.0, 0.0, true),
            record(0.0, 0.0, 0.0, true),
            record(1.0, 0.0, 1.0, false),
            record(0.0, 0.0, 0.0, true),
        ];
        let kpi = KpiReport::from_records(&records, 0.25, 10.0);
        assert!((kpi.demand_met_pct - 75.0).abs() < 1e-4);
    }

    #[test]
    fn empty_records() {
        let kpi = KpiReport::from_records(&[], 1.0, 10.0);
        assert_eq!(kpi.total_import_kwh, 0.0);
        assert_eq!(kpi.demand_met_pct, 0.0);
    }

    #[test]
    fn display_does_not_panic() {
        let kpi = KpiReport::from_records(&[record(1.0, 0.0, 1.0, true)], 1.0, 10.0);
        assert!(!format!("{kpi}").is_empty());
    }
}
