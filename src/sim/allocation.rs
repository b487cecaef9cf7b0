//! Per-tick bookkeeping for the shared spare-power pool.

/// Accumulates the fleet-wide spare-power offer and the consumer-pool demand
/// for exactly one tick.
///
/// Owned by the engine and passed by reference into the batteries' phases:
/// [`begin_step`](Self::begin_step) must run before any battery's
/// demand/predict phase, and every spare-power contribution must be recorded
/// before the first allocation query. The engine's phase ordering guarantees
/// this; the context itself is plain data.
#[derive(Debug, Clone, Default)]
pub struct AllocationContext {
    total_spare_power_kw: f32,
    consumer_demand_kw: f32,
}

impl AllocationContext {
    /// Creates a context with zeroed aggregates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets both aggregates and installs this tick's consumer demand.
    pub fn begin_step(&mut self, consumer_demand_kw: f32) {
        self.total_spare_power_kw = 0.0;
        self.consumer_demand_kw = consumer_demand_kw;
    }

    /// Adds one battery's predicted spare power to the pool.
    pub fn add_spare_power(&mut self, kw: f32) {
        self.total_spare_power_kw += kw;
    }

    /// Fleet-wide spare power accumulated this tick (kW).
    pub fn total_spare_power_kw(&self) -> f32 {
        self.total_spare_power_kw
    }

    /// Consumer-pool demand this tick (kW).
    pub fn consumer_demand_kw(&self) -> f32 {
        self.consumer_demand_kw
    }

    /// Proportional, capped share of the consumer demand owed by a battery
    /// that offered `spare_power_kw`.
    ///
    /// The fleet never gives more than the consumers need, and no battery is
    /// asked for more than its proportional slice of the offer. A zero pool
    /// allocates nothing.
    pub fn consumer_share_kw(&self, spare_power_kw: f32) -> f32 {
        if self.total_spare_power_kw == 0.0 {
            return 0.0;
        }
        let total_given_kw = self.total_spare_power_kw.min(self.consumer_demand_kw);
        (spare_power_kw / self.total_spare_power_kw) * total_given_kw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proportional_capped_shares() {
        // Fleet offers 100 kW, consumers need 60 kW: shares scale to 60.
        let mut ctx = AllocationContext::new();
        ctx.begin_step(60.0);
        ctx.add_spare_power(75.0);
        ctx.add_spare_power(25.0);

        assert!((ctx.consumer_share_kw(75.0) - 45.0).abs() < 1e-5);
        assert!((ctx.consumer_share_kw(25.0) - 15.0).abs() < 1e-5);
    }

    #[test]
    fn demand_above_offer_is_capped_at_offer() {
        let mut ctx = AllocationContext::new();
        ctx.begin_step(500.0);
        ctx.add_spare_power(30.0);
        ctx.add_spare_power(10.0);

        // min(total_spare, demand) = 40, split 30/10.
        assert!((ctx.consumer_share_kw(30.0) - 30.0).abs() < 1e-5);
        assert!((ctx.consumer_share_kw(10.0) - 10.0).abs() < 1e-5);
    }

    #[test]
    fn empty_pool_allocates_nothing() {
        let mut ctx = AllocationContext::new();
        ctx.begin_step(60.0);
        assert_eq!(ctx.consumer_share_kw(0.0), 0.0);
    }

    #[test]
    fn begin_step_clears_previous_tick() {
        let mut ctx = AllocationContext::new();
        ctx.begin_step(60.0);
        ctx.add_spare_power(100.0);

        ctx.begin_step(0.0);
        assert_eq!(ctx.total_spare_power_kw(), 0.0);
        assert_eq!(ctx.consumer_demand_kw(), 0.0);
        assert_eq!(ctx.consumer_share_kw(50.0), 0.0);
    }
}
