//! Assertion helpers for integration tests.

use super::TestSim;

impl TestSim {
    /// Every cross-component invariant held on every validated tick.
    pub fn assert_invariants_clean(&self) {
        let violations = self
            .sim
            .world()
            .resource::<crate::invariant_checks::InvariantViolations>();
        assert_eq!(
            violations.total(),
            0,
            "invariant violations detected: {violations:?}"
        );
    }

    pub fn assert_active_trains(&self, expected: usize) {
        assert_eq!(
            self.active_trains(),
            expected,
            "expected {expected} active trains, found {}",
            self.active_trains()
        );
    }

    /// Every train's occupancy is within its capacity.
    pub fn assert_occupancy_bounds(&self) {
        for train in &self.sim.fleet().active {
            assert!(
                train.occupancy() <= train.max_capacity,
                "train {} over capacity: {}/{}",
                train.id,
                train.occupancy(),
                train.max_capacity
            );
        }
    }
}
