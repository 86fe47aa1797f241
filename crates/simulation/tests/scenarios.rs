//! End-to-end scenarios driving the whole engine through the public
//! harness: dispatch discipline, reversal round trips, routing, capacity
//! behavior and the cross-component invariants.

use simulation::customer_gen::{ArrivalProfile, CustomerGenerator};
use simulation::engine::Simulation;
use simulation::error::SimError;
use simulation::events::{DisruptionEvent, DisruptionKind};
use simulation::line::{Line, SchedulePolicy};
use simulation::network::RailNetwork;
use simulation::path_table::{PathTable, Segment};
use simulation::record_store::RecordStore;
use simulation::station::Station;
use simulation::test_harness::{test_config, three_station_network, TestSim};
use simulation::train::Train;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Single line dispatching one train from station 1 at service start,
/// with a headway long enough that no second train ever follows.
fn one_train_network() -> RailNetwork {
    let mut network = RailNetwork::new();
    network.add_station(Station::new(1, "A"));
    network.add_station(Station::new(2, "B"));
    network.add_station(Station::new(3, "C"));
    let line = Line::new(
        "T1",
        "T1",
        vec![1.into(), 2.into(), 3.into()],
        vec![60.0, 120.0],
        SchedulePolicy {
            headway: 1_000_000.0,
            service_hours: (0, 24),
            capacity: 1000,
        },
        1,
        true,
    )
    .unwrap();
    network.add_line(line).unwrap();
    network
}

// ---------------------------------------------------------------------------
// Full-day single line scenario
// ---------------------------------------------------------------------------

#[test]
fn single_line_constant_arrivals_stays_healthy() {
    let mut harness = TestSim::single_line();
    harness.tick(2990);

    // Fleet saturates at its cap and stays there.
    harness.assert_active_trains(4);

    // Passengers flow: some have completed their journey and their slots
    // were recycled, and the queues stay bounded.
    assert!(harness.total_alighted() > 0.0);
    assert!(harness.free_count() > 0);
    assert!(harness.waiting_total() < 1000);

    // One metrics sample per tick.
    assert_eq!(harness.sim.metrics().len(), 2990);
    let last = harness.last_metrics().unwrap();
    assert_eq!(last.tick, 2990);
    assert_eq!(last.active_trains, 4);

    harness.assert_occupancy_bounds();
    harness.assert_invariants_clean();
}

// ---------------------------------------------------------------------------
// Dispatch discipline
// ---------------------------------------------------------------------------

#[test]
fn one_departure_per_direction_per_headway() {
    let mut harness = TestSim::single_line_empty();

    // Within the first headway window exactly one train per direction.
    harness.tick(180);
    harness.assert_active_trains(2);
    assert_eq!(harness.train(0).direction, 1);
    assert_eq!(harness.train(1).direction, -1);

    // The second pair leaves no earlier than one headway after the first.
    harness.tick(1);
    harness.assert_active_trains(4);
}

#[test]
fn no_dispatch_before_service_start() {
    let mut config = test_config(1_000);
    // Two seconds before the 06:00 service start.
    config.start_time = 6.0 * 3600.0 - 2.0;
    let mut harness = TestSim::new(config, three_station_network());

    harness.tick(1);
    harness.assert_active_trains(0);
    harness.tick(1);
    harness.assert_active_trains(2);
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[test]
fn planning_the_same_route_twice_shares_one_path() {
    let network = three_station_network();
    let mut paths = PathTable::default();

    let first = network.find_path(&mut paths, 1, 3);
    let second = network.find_path(&mut paths, 1, 3);
    assert!(first > 0);
    assert_eq!(first, second);
    assert_eq!(
        paths.expand(first).unwrap(),
        &[Segment::new("T1", 1, 2), Segment::new("T1", 2, 3)]
    );
}

#[test]
fn unreachable_passengers_never_board() {
    let mut network = one_train_network();
    // An island station with arrivals but no line.
    network.add_station(Station::new(9, "Island"));

    let mut config = test_config(10_000);
    config.start_time = 0.0;
    let mut harness = TestSim::new(config, network);
    harness.sim.add_customer_generator(CustomerGenerator::new(
        9,
        ArrivalProfile::Constant { rate: 0.5 },
        7,
    ));

    harness.tick(600);

    // Island passengers got path_id 0, kept waiting, accumulated wait time.
    let store = harness.sim.record_store();
    let mut stranded = 0;
    for (_, row) in store.iter_live() {
        assert_eq!(row.path_id, 0);
        assert!(row.total_wait_time > 0.0);
        stranded += 1;
    }
    assert!(stranded > 0);
    assert_eq!(harness.total_boarded(), 0.0);
    harness.assert_invariants_clean();
}

// ---------------------------------------------------------------------------
// Reversal round trip
// ---------------------------------------------------------------------------

#[test]
fn terminal_reversal_rebuilds_the_return_run() {
    let mut config = test_config(1_000);
    config.start_time = 0.0;
    let mut harness = TestSim::new(config, one_train_network());

    // Dispatch happens on tick 1; the forward run takes 180 s plus a 30 s
    // dwell at the intermediate station, so the terminal is reached at
    // t = 181 — never earlier than depart + sum of segment times.
    harness.tick(181);
    harness.assert_active_trains(1);
    let train = harness.train(0);
    assert_eq!(train.direction, -1);
    assert_eq!(train.timetable_idx, 0);
    assert_eq!(train.current_station, Some(3));
    assert_eq!(train.timetable[0], (181.0, 3));
    // Return run is scheduled from the reversal time.
    assert_eq!(train.timetable[1], (301.0, 2));
    assert_eq!(train.timetable[2], (361.0, 1));

    // The return leg walks the timetable back toward station 1.
    harness.tick(120);
    let train = harness.train(0);
    assert_eq!(train.timetable_idx, 1);
    assert_eq!(train.current_station, Some(2));

    // Back at the origin terminal no earlier than depart + 2x run time.
    harness.tick(60);
    let train = harness.train(0);
    assert_eq!(train.current_station, Some(1));
    assert!(harness.clock().time >= 1.0 + 2.0 * 180.0);
    harness.assert_invariants_clean();
}

// ---------------------------------------------------------------------------
// Record store and train capacity behavior through the public API
// ---------------------------------------------------------------------------

#[test]
fn released_slots_are_reused_lifo() {
    let mut store = RecordStore::with_capacity(100);
    let indices = store.allocate(10).unwrap();
    assert_eq!(indices, (0..10).collect::<Vec<_>>());

    for &idx in &indices[..5] {
        store.release(idx);
    }
    assert_eq!(store.allocate(5).unwrap(), vec![4, 3, 2, 1, 0]);
}

#[test]
fn full_train_boards_nobody() {
    let mut store = RecordStore::with_capacity(16);
    let indices = store.allocate(10).unwrap();
    for &idx in &indices {
        let id = store.next_id();
        store.row_mut(idx).id = id;
    }

    let mut train = Train::new(1, "T1", vec![(0.0, 1), (60.0, 2)], 2, 1);
    let boarded = train.board(&[0, 1, 2, 3, 4], &mut store);
    assert_eq!(boarded, vec![0, 1]);
    assert_eq!(train.occupancy(), 2);

    let second = train.board(&[5, 6, 7, 8, 9], &mut store);
    assert!(second.is_empty());
    assert_eq!(train.occupancy(), 2);
}

#[test]
fn overflow_candidates_return_to_the_queue_head() {
    // A tiny train and a burst of passengers all heading the same way.
    let mut network = RailNetwork::new();
    network.add_station(Station::new(1, "A"));
    network.add_station(Station::new(2, "B"));
    let line = Line::new(
        "T1",
        "T1",
        vec![1.into(), 2.into()],
        vec![60.0],
        SchedulePolicy {
            headway: 1_000_000.0,
            service_hours: (0, 24),
            capacity: 3,
        },
        1,
        true,
    )
    .unwrap();
    network.add_line(line).unwrap();

    let mut config = test_config(10_000);
    config.start_time = 0.0;
    let mut harness = TestSim::new(config, network);
    harness.sim.add_customer_generator(CustomerGenerator::new(
        1,
        ArrivalProfile::Constant { rate: 2.0 },
        11,
    ));

    harness.tick(600);

    // Train capacity is 3, so boardings happen in waves but nobody is
    // lost: every live passenger is either queued or on the train.
    let store = harness.sim.record_store();
    let queued = harness.waiting_total();
    let onboard: usize = harness
        .sim
        .fleet()
        .active
        .iter()
        .map(|t| t.occupancy() as usize)
        .sum();
    assert_eq!(store.live_count(), queued + onboard);
    harness.assert_occupancy_bounds();
    harness.assert_invariants_clean();
}

// ---------------------------------------------------------------------------
// Capacity faults, snapshots, disruptions
// ---------------------------------------------------------------------------

#[test]
fn record_store_exhaustion_aborts_the_run() {
    let mut config = test_config(8);
    config.start_time = 0.0;
    config.validate_invariants = false;
    let mut sim = Simulation::new(config, one_train_network());
    sim.add_customer_generator(CustomerGenerator::new(
        1,
        ArrivalProfile::Constant { rate: 10.0 },
        3,
    ));

    let err = sim.run(600).unwrap_err();
    assert_eq!(err, SimError::CapacityExceeded { capacity: 8 });
}

#[test]
fn snapshots_fire_on_the_interval() {
    let mut config = test_config(10_000);
    config.start_time = 6.0 * 3600.0;
    config.snapshot_interval = 100;
    let mut harness = TestSim::new(config, three_station_network());
    harness.sim.add_customer_generator(CustomerGenerator::new(
        1,
        ArrivalProfile::Constant { rate: 0.2 },
        42,
    ));

    harness.tick(250);
    assert_eq!(harness.snapshot_count(), 2);

    let world = harness.sim.world();
    let history = world.resource::<simulation::snapshot::SnapshotHistory>();
    assert_eq!(history.snapshots[0].tick, 100);
    assert_eq!(history.snapshots[1].tick, 200);
    assert!(!history.snapshots[1].rows.is_empty());
}

#[test]
fn due_disruptions_drain_from_the_queue() {
    let mut config = test_config(1_000);
    config.start_time = 0.0;
    let mut harness = TestSim::new(config, one_train_network());
    harness.sim.schedule_disruption(DisruptionEvent {
        at_time: 50.0,
        kind: DisruptionKind::LineSuspended {
            line_code: "T1".to_string(),
        },
        description: "points failure at B".to_string(),
    });
    harness.sim.schedule_disruption(DisruptionEvent {
        at_time: 5_000.0,
        kind: DisruptionKind::StationClosed { station_id: 2 },
        description: "B closed".to_string(),
    });

    harness.tick(100);
    let world = harness.sim.world();
    let queue = world.resource::<simulation::events::DisruptionQueue>();
    assert_eq!(queue.pending.len(), 1);
    assert_eq!(queue.pending[0].at_time, 5_000.0);
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn identical_seeds_reproduce_identical_metrics() {
    let mut a = TestSim::single_line();
    let mut b = TestSim::single_line();
    a.tick(400);
    b.tick(400);
    assert_eq!(a.sim.metrics(), b.sim.metrics());
}
