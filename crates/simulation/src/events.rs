//! Externally injected disruption events.
//!
//! The queue is a hook: callers may schedule disruptions ahead of time and
//! the loop acknowledges them when they fall due. Acting on them (rerouting,
//! line suspension) is left to the owner of the hook — the engine itself
//! only journals and drops them.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::clock::SimClock;
use crate::station::StationId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DisruptionKind {
    LineSuspended { line_code: String },
    StationClosed { station_id: StationId },
    SpeedRestriction { line_code: String, factor: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisruptionEvent {
    /// Simulated time at which the disruption takes effect.
    pub at_time: f64,
    pub kind: DisruptionKind,
    pub description: String,
}

#[derive(Resource, Default)]
pub struct DisruptionQueue {
    pub pending: Vec<DisruptionEvent>,
}

impl DisruptionQueue {
    pub fn schedule(&mut self, event: DisruptionEvent) {
        self.pending.push(event);
    }
}

/// Acknowledge due events and drop them.
pub fn process_disruptions(mut queue: ResMut<DisruptionQueue>, clock: Res<SimClock>) {
    let now = clock.time;
    queue.pending.retain(|event| {
        if event.at_time <= now {
            info!("disruption acknowledged: {}", event.description);
            false
        } else {
            true
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_events_drain() {
        let mut queue = DisruptionQueue::default();
        queue.schedule(DisruptionEvent {
            at_time: 100.0,
            kind: DisruptionKind::LineSuspended {
                line_code: "T1".to_string(),
            },
            description: "signal failure".to_string(),
        });
        queue.schedule(DisruptionEvent {
            at_time: 900.0,
            kind: DisruptionKind::StationClosed { station_id: 2 },
            description: "station closed".to_string(),
        });

        let now = 500.0;
        queue.pending.retain(|e| e.at_time > now);
        assert_eq!(queue.pending.len(), 1);
        assert_eq!(queue.pending[0].at_time, 900.0);
    }
}
