//! # TestSim — headless integration harness
//!
//! Wraps [`Simulation`](crate::engine::Simulation) with canned networks,
//! deterministic seeds and query/assertion helpers so integration tests
//! and benches can drive whole scenarios without boilerplate. Invariant
//! validation is always enabled here.

mod assertions;
mod queries;
mod setup;

pub use setup::{test_config, three_station_network};

use crate::config::SimulationConfig;
use crate::customer_gen::{ArrivalProfile, CustomerGenerator};
use crate::engine::Simulation;
use crate::network::RailNetwork;

pub struct TestSim {
    pub sim: Simulation,
}

impl TestSim {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    pub fn new(config: SimulationConfig, network: RailNetwork) -> Self {
        Self {
            sim: Simulation::new(config, network),
        }
    }

    /// Three stations on one bidirectional line, no arrival sources.
    pub fn single_line_empty() -> Self {
        Self::new(test_config(10_000), three_station_network())
    }

    /// Three stations on one bidirectional line with constant-rate arrival
    /// sources at stations 1 and 2. The clock starts at 06:00, right at
    /// the opening of the service window.
    pub fn single_line() -> Self {
        let mut harness = Self::new(test_config(50_000), three_station_network());
        harness.sim.add_customer_generator(CustomerGenerator::new(
            1,
            ArrivalProfile::Constant { rate: 0.2 },
            42,
        ));
        harness.sim.add_customer_generator(CustomerGenerator::new(
            2,
            ArrivalProfile::Constant { rate: 0.2 },
            43,
        ));
        harness
    }
}
