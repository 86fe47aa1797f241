//! Canned networks and configurations for integration tests.

use crate::config::SimulationConfig;
use crate::line::{Line, SchedulePolicy};
use crate::network::RailNetwork;
use crate::station::Station;

/// Stations 1..=3 joined by bidirectional line T1 with segment times
/// 60 s and 120 s, 180 s headway, 06:00–22:00 service, fleet of 4.
pub fn three_station_network() -> RailNetwork {
    let mut network = RailNetwork::new();
    network.add_station(Station::new(1, "Central").with_capacities(5_000, 10_000));
    network.add_station(Station::new(2, "Redfern").with_capacities(2_000, 4_000));
    network.add_station(Station::new(3, "Erskineville").with_capacities(1_500, 3_000));

    let line = Line::new(
        "T1",
        "T1",
        vec![1.into(), 2.into(), 3.into()],
        vec![60.0, 120.0],
        SchedulePolicy {
            headway: 180.0,
            service_hours: (6, 22),
            capacity: 1000,
        },
        4,
        true,
    )
    .expect("canned line is valid");
    network.add_line(line).expect("stations are registered");
    network
}

/// Quiet config starting at 06:00 with invariant validation on.
pub fn test_config(capacity: usize) -> SimulationConfig {
    SimulationConfig {
        capacity,
        dt: 1.0,
        snapshot_interval: 3600,
        start_time: 6.0 * 3600.0,
        validate_invariants: true,
        log_level: None,
    }
}
