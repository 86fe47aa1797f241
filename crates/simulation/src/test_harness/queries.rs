//! Read-side helpers over the harnessed world.

use super::TestSim;
use crate::clock::SimClock;
use crate::invariant_checks::InvariantViolations;
use crate::metrics::TickMetrics;
use crate::snapshot::SnapshotHistory;
use crate::train::Train;

impl TestSim {
    /// Run `n` ticks by executing the `FixedUpdate` schedule directly —
    /// exactly one tick per call, independent of wall-clock time.
    pub fn tick(&mut self, n: u64) {
        for _ in 0..n {
            self.sim.step();
        }
    }

    pub fn clock(&self) -> SimClock {
        self.sim.clock().clone()
    }

    pub fn active_trains(&self) -> usize {
        self.sim.fleet().active.len()
    }

    pub fn train(&self, index: usize) -> &Train {
        &self.sim.fleet().active[index]
    }

    pub fn last_metrics(&self) -> Option<TickMetrics> {
        self.sim.last_metrics()
    }

    /// Passengers queued across all stations right now.
    pub fn waiting_total(&self) -> usize {
        self.sim.network().total_waiting()
    }

    /// Released slots waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.sim.record_store().free_count()
    }

    /// Completed boardings over the whole run so far.
    pub fn total_boarded(&self) -> f64 {
        let dt = self.sim.clock().dt;
        self.sim
            .metrics()
            .iter()
            .map(|m| m.boarding_rate * dt)
            .sum()
    }

    /// Completed alightings over the whole run so far.
    pub fn total_alighted(&self) -> f64 {
        let dt = self.sim.clock().dt;
        self.sim.metrics().iter().map(|m| m.alight_rate * dt).sum()
    }

    pub fn snapshot_count(&self) -> usize {
        self.sim
            .world()
            .resource::<SnapshotHistory>()
            .snapshots
            .len()
    }

    pub fn violations_total(&self) -> u32 {
        self.sim.world().resource::<InvariantViolations>().total()
    }
}
