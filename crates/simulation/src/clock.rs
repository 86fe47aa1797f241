//! Simulated clock resource.
//!
//! Simulation time is fully decoupled from the wall clock: the clock only
//! advances when `tick_clock` runs at the head of a `FixedUpdate` pass,
//! always by exactly `dt` seconds.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    /// Ticks completed so far. The first tick is tick 1.
    pub tick: u64,
    /// Simulated seconds since midnight of day zero.
    pub time: f64,
    /// Seconds advanced per tick.
    pub dt: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            tick: 0,
            time: 0.0,
            dt: 1.0,
        }
    }
}

impl SimClock {
    /// Clock starting at `start_time` seconds, advancing `dt` per tick.
    pub fn starting_at(dt: f64, start_time: f64) -> Self {
        Self {
            tick: 0,
            time: start_time,
            dt,
        }
    }

    pub fn advance(&mut self) {
        self.tick += 1;
        self.time += self.dt;
    }

    /// Fractional hour-of-day in `[0, 24)`.
    pub fn hour_of_day(&self) -> f64 {
        (self.time / 3600.0) % 24.0
    }

    pub fn formatted(&self) -> String {
        let h = self.hour_of_day() as u32;
        let m = ((self.time / 60.0) % 60.0) as u32;
        format!("tick {} {:02}:{:02}", self.tick, h, m)
    }
}

pub fn tick_clock(mut clock: ResMut<SimClock>) {
    clock.advance();
    if clock.tick % 100 == 0 {
        info!(
            "=== Tick {} | Time: {:.1}s ({:.2}h) ===",
            clock.tick,
            clock.time,
            clock.time / 3600.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_increments_tick_and_time() {
        let mut clock = SimClock::starting_at(1.0, 21_600.0);
        clock.advance();
        assert_eq!(clock.tick, 1);
        assert_eq!(clock.time, 21_601.0);
    }

    #[test]
    fn test_hour_of_day_wraps() {
        let clock = SimClock::starting_at(1.0, 25.0 * 3600.0);
        assert!((clock.hour_of_day() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hour_of_day_at_six() {
        let clock = SimClock::starting_at(1.0, 6.0 * 3600.0);
        assert!((clock.hour_of_day() - 6.0).abs() < 1e-9);
    }
}
