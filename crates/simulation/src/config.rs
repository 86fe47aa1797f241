//! Engine-wide constants and the top-level simulation configuration.

use bevy::log::Level;
use bevy::prelude::*;

/// Default capacity of the passenger record store.
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Seconds a train dwells at every stop (terminals included).
pub const DWELL_SECONDS: f64 = 30.0;

/// Floor on the scheduled interval between consecutive timetable stops.
/// Prevents degenerate zero-length segments from collapsing a run.
pub const MIN_SEGMENT_INTERVAL: f64 = 10.0;

/// Top-level knobs for a simulation run.
///
/// Constructed programmatically and inserted as a resource; there is no
/// config-file format. `log_level: None` skips installing the log plugin,
/// which keeps repeated construction (tests, benches) from fighting over
/// the global tracing subscriber.
#[derive(Resource, Debug, Clone)]
pub struct SimulationConfig {
    /// Number of passenger slots in the record store.
    pub capacity: usize,
    /// Seconds of simulated time per tick.
    pub dt: f64,
    /// Take a snapshot every this many ticks. 0 disables snapshots.
    pub snapshot_interval: u64,
    /// Simulated clock value (seconds since midnight) before the first tick.
    pub start_time: f64,
    /// Run the end-of-tick invariant validation pass.
    pub validate_invariants: bool,
    /// Console log level, or `None` for silent operation.
    pub log_level: Option<Level>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            dt: 1.0,
            snapshot_interval: 3600,
            start_time: 0.0,
            validate_invariants: false,
            log_level: None,
        }
    }
}
