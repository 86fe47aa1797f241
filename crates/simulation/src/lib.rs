//! Discrete-time agent-based simulation of an urban rail transit network.
//!
//! All state lives in ECS resources — the record store is the single
//! shared mutable arena, stations and trains own only slot indices — and
//! each tick runs the phase chain below inside `FixedUpdate`:
//!
//! generation -> path assignment -> dispatch -> train update ->
//! wait accumulation -> metrics -> snapshot -> events
//!
//! The phase order is part of the engine contract; tests depend on it.

use bevy::prelude::*;

pub mod clock;
pub mod config;
pub mod customer_gen;
pub mod engine;
pub mod error;
pub mod events;
pub mod invariant_checks;
pub mod line;
pub mod metrics;
pub mod network;
pub mod path_table;
pub mod record_store;
pub mod schedule;
pub mod snapshot;
pub mod station;
pub mod test_harness;
pub mod train;
pub mod train_gen;

/// Tick phases, chained in this order inside `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Clock,
    Generate,
    Routing,
    Dispatch,
    TrainUpdate,
    Accumulate,
    Metrics,
    Snapshot,
    Events,
    Validate,
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<config::SimulationConfig>()
            .init_resource::<clock::SimClock>()
            .init_resource::<record_store::RecordStore>()
            .init_resource::<network::RailNetwork>()
            .init_resource::<path_table::PathTable>()
            .init_resource::<train::TrainFleet>()
            .init_resource::<customer_gen::CustomerGenerators>()
            .init_resource::<customer_gen::FreshArrivals>()
            .init_resource::<metrics::MetricsHistory>()
            .init_resource::<metrics::TickThroughput>()
            .init_resource::<snapshot::SnapshotHistory>()
            .init_resource::<events::DisruptionQueue>()
            .init_resource::<invariant_checks::InvariantViolations>()
            .init_resource::<engine::SimFault>();

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Clock,
                SimulationSet::Generate,
                SimulationSet::Routing,
                SimulationSet::Dispatch,
                SimulationSet::TrainUpdate,
                SimulationSet::Accumulate,
                SimulationSet::Metrics,
                SimulationSet::Snapshot,
                SimulationSet::Events,
                SimulationSet::Validate,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                clock::tick_clock.in_set(SimulationSet::Clock),
                customer_gen::generate_customers.in_set(SimulationSet::Generate),
                network::assign_paths_and_enqueue.in_set(SimulationSet::Routing),
                train_gen::dispatch_trains.in_set(SimulationSet::Dispatch),
                train::update_trains.in_set(SimulationSet::TrainUpdate),
                metrics::accumulate_wait_times.in_set(SimulationSet::Accumulate),
                metrics::collect_metrics.in_set(SimulationSet::Metrics),
                snapshot::take_snapshot.in_set(SimulationSet::Snapshot),
                events::process_disruptions.in_set(SimulationSet::Events),
                invariant_checks::validate_invariants.in_set(SimulationSet::Validate),
            ),
        );
    }
}
