// ---------------------------------------------------------------------------
// SimError: typed errors for network construction and the tick path
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors raised by the engine.
///
/// Construction problems (`UnknownStation`, `InvalidSchedule`) abort setup.
/// `CapacityExceeded` is the only runtime error: it is parked in the
/// [`SimFault`](crate::engine::SimFault) resource by the system that hit it
/// and surfaced as `Err` from `Simulation::run` at the end of the tick.
/// An unreachable destination is deliberately NOT an error — routing writes
/// `path_id = 0` and the passenger stays in queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// The record store has no free slot left.
    CapacityExceeded { capacity: usize },
    /// A line references a station that was never registered.
    UnknownStation { station: String },
    /// A line or departure schedule is structurally invalid.
    InvalidSchedule { reason: String },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::CapacityExceeded { capacity } => {
                write!(f, "record store capacity exceeded ({capacity} slots)")
            }
            SimError::UnknownStation { station } => {
                write!(f, "unknown station: {station}")
            }
            SimError::InvalidSchedule { reason } => {
                write!(f, "invalid schedule: {reason}")
            }
        }
    }
}

impl std::error::Error for SimError {}
