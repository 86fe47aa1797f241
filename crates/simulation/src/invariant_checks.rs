//! End-of-tick invariant guards over the shared record store.
//!
//! Correctness here spans components: queue membership must agree with row
//! state, train occupancy with onboard lists, and the free stack with live
//! ids. The pass is opt-in (`SimulationConfig::validate_invariants`) since
//! it scans every row and every queue; the test harness always enables it.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::config::SimulationConfig;
use crate::network::RailNetwork;
use crate::path_table::PathTable;
use crate::record_store::{PassengerState, RecordStore};
use crate::train::TrainFleet;

/// Cumulative violation counts since the start of the run. All-zero after
/// a healthy run; integration tests assert exactly that.
#[derive(Resource, Default, Debug)]
pub struct InvariantViolations {
    /// WAITING row not in exactly one station queue.
    pub waiting_membership: u32,
    /// ONBOARD row not in exactly one train, or `on_train` mismatch.
    pub onboard_membership: u32,
    /// Train occupancy above its capacity.
    pub over_capacity: u32,
    /// Queued row in a state other than WAITING/TRANSFERRING.
    pub queue_state: u32,
    /// Free stack overlapping live rows, or impossible slot accounting.
    pub free_stack: u32,
    /// Assigned path that does not expand or does not start at the origin.
    pub path_origin: u32,
}

impl InvariantViolations {
    pub fn total(&self) -> u32 {
        self.waiting_membership
            + self.onboard_membership
            + self.over_capacity
            + self.queue_state
            + self.free_stack
            + self.path_origin
    }
}

pub fn validate_invariants(
    config: Res<SimulationConfig>,
    store: Res<RecordStore>,
    network: Res<RailNetwork>,
    fleet: Res<TrainFleet>,
    paths: Res<PathTable>,
    mut violations: ResMut<InvariantViolations>,
) {
    if !config.validate_invariants {
        return;
    }

    // Queue membership counts per slot index.
    let mut queued: HashMap<u32, u32> = HashMap::new();
    for station in network.stations_in_order() {
        for idx in station.waiting_indices() {
            *queued.entry(idx).or_insert(0) += 1;
            let state = store.row(idx).state;
            if state != PassengerState::Waiting && state != PassengerState::Transferring {
                warn!("invariant violation: queued row {idx} has state {state:?}");
                violations.queue_state += 1;
            }
        }
    }

    // Onboard membership: slot index -> (count, carrying train).
    let mut onboard: HashMap<u32, (u32, u32)> = HashMap::new();
    for train in &fleet.active {
        if train.occupancy() > train.max_capacity {
            warn!(
                "invariant violation: train {} occupancy {} > capacity {}",
                train.id,
                train.occupancy(),
                train.max_capacity
            );
            violations.over_capacity += 1;
        }
        for &idx in train.onboard_indices() {
            let entry = onboard.entry(idx).or_insert((0, train.id));
            entry.0 += 1;
            entry.1 = train.id;
        }
    }

    for (idx, row) in store.iter_live() {
        match row.state {
            PassengerState::Waiting => {
                if queued.get(&idx).copied().unwrap_or(0) != 1 {
                    warn!("invariant violation: WAITING row {idx} not in exactly one queue");
                    violations.waiting_membership += 1;
                }
            }
            PassengerState::Onboard => match onboard.get(&idx) {
                Some(&(1, train_id)) if train_id == row.on_train => {}
                _ => {
                    warn!(
                        "invariant violation: ONBOARD row {idx} membership/on_train mismatch"
                    );
                    violations.onboard_membership += 1;
                }
            },
            _ => {}
        }

        if row.path_id != 0 {
            match paths.expand(row.path_id) {
                Some(segments)
                    if segments.first().map(|s| s.from) == Some(row.origin_station) => {}
                _ => {
                    warn!(
                        "invariant violation: row {idx} path {} does not start at origin {}",
                        row.path_id, row.origin_station
                    );
                    violations.path_origin += 1;
                }
            }
        }
    }

    // Free stack and live rows must be disjoint and fit the capacity.
    let live = store.live_count();
    for &idx in store.free_indices() {
        if store.row(idx).is_live() {
            warn!("invariant violation: free slot {idx} holds a live row");
            violations.free_stack += 1;
        }
    }
    if store.free_count() + live > store.capacity() {
        warn!(
            "invariant violation: free {} + live {} exceeds capacity {}",
            store.free_count(),
            live,
            store.capacity()
        );
        violations.free_stack += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_sums_fields() {
        let violations = InvariantViolations {
            waiting_membership: 1,
            onboard_membership: 2,
            over_capacity: 3,
            queue_state: 4,
            free_stack: 5,
            path_origin: 6,
        };
        assert_eq!(violations.total(), 21);
    }

    #[test]
    fn test_default_is_clean() {
        assert_eq!(InvariantViolations::default().total(), 0);
    }
}
