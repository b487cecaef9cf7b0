use chrono::{Duration, NaiveDateTime};

use super::types::SimConfig;

/// A simulation clock that maps step indices to absolute timestamps.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use prosumer_sim::sim::clock::Clock;
///
/// let start = NaiveDate::from_ymd_opt(2016, 7, 1)
///     .and_then(|d| d.and_hms_opt(0, 0, 0))
///     .expect("valid start");
/// let mut clock = Clock::new(start, 900, 3);
/// let mut steps = Vec::new();
///
/// clock.run(|step, _time| steps.push(step));
/// assert_eq!(steps, vec![0, 1, 2]);
/// ```
pub struct Clock {
    current: usize,
    total: usize,
    start: NaiveDateTime,
    step_seconds: u32,
}

impl Clock {
    /// Creates a clock starting at `start` advancing `step_seconds` per tick
    /// for `total` ticks.
    pub fn new(start: NaiveDateTime, step_seconds: u32, total: usize) -> Self {
        Self {
            current: 0,
            total,
            start,
            step_seconds,
        }
    }

    /// Creates a clock covering a configuration's full horizon.
    pub fn for_config(config: &SimConfig) -> Self {
        Self::new(config.start, config.step_seconds, config.total_steps())
    }

    /// Advances by one step.
    ///
    /// Returns the step index and its timestamp, or `None` once the horizon
    /// is exhausted.
    pub fn tick(&mut self) -> Option<(usize, NaiveDateTime)> {
        if self.current < self.total {
            let step = self.current;
            self.current += 1;
            let time =
                self.start + Duration::seconds(step as i64 * self.step_seconds as i64);
            Some((step, time))
        } else {
            None
        }
    }

    /// Runs a function for each remaining step.
    pub fn run(&mut self, mut f: impl FnMut(usize, NaiveDateTime)) {
        while let Some((step, time)) = self.tick() {
            f(step, time);
        }
    }
}
