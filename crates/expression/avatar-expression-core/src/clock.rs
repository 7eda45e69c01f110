//! Fixed-rate tick source; the only notion of time inside the engine.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameClock {
    tick_rate_hz: u32,
    now: u64,
    /// Host seconds not yet converted into whole ticks.
    accumulator: f64,
    max_catch_up_ticks: u32,
}

impl FrameClock {
    pub fn new(tick_rate_hz: u32, max_catch_up_ticks: u32) -> Self {
        Self {
            tick_rate_hz: tick_rate_hz.max(1),
            now: 0,
            accumulator: 0.0,
            max_catch_up_ticks: max_catch_up_ticks.max(1),
        }
    }

    /// Current tick. Starts at 0 before the first `advance`.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    #[inline]
    pub fn tick_rate_hz(&self) -> u32 {
        self.tick_rate_hz
    }

    #[inline]
    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.tick_rate_hz as f64
    }

    /// Move to the next tick and return it.
    #[inline]
    pub fn advance(&mut self) -> u64 {
        self.now = self.now.wrapping_add(1);
        self.now
    }

    /// Feed host wall time and return how many whole ticks are due.
    /// The fractional remainder carries into the next call; time beyond
    /// `max_catch_up_ticks` is dropped so a stalled host does not trigger a
    /// burst of catch-up ticks.
    pub fn accumulate(&mut self, dt_seconds: f64) -> u32 {
        if !dt_seconds.is_finite() || dt_seconds <= 0.0 {
            return 0;
        }
        let step = self.tick_seconds();
        self.accumulator += dt_seconds;
        let due = (self.accumulator / step).floor();
        if due >= self.max_catch_up_ticks as f64 {
            self.accumulator = 0.0;
            return self.max_catch_up_ticks;
        }
        self.accumulator -= due * step;
        due as u32
    }

    pub fn ticks_from_millis(&self, millis: u64) -> u64 {
        (millis * self.tick_rate_hz as u64 + 999) / 1000
    }

    pub fn millis_from_ticks(&self, ticks: u64) -> u64 {
        ticks * 1000 / self.tick_rate_hz as u64
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60, 8)
    }
}
