//! The headless simulation runner.
//!
//! `Simulation` wraps a `bevy::app::App` built with `MinimalPlugins` and
//! drives the `FixedUpdate` schedule manually, one call per tick. Nothing
//! about the wall clock can advance the simulation: the fixed timestep is
//! pinned far out of reach and every tick comes from `run`/`step`.

use bevy::log::LogPlugin;
use bevy::prelude::*;

use crate::clock::SimClock;
use crate::config::SimulationConfig;
use crate::customer_gen::{CustomerGenerator, CustomerGenerators};
use crate::error::SimError;
use crate::events::DisruptionEvent;
use crate::metrics::{MetricsHistory, TickMetrics};
use crate::network::RailNetwork;
use crate::record_store::RecordStore;
use crate::train::TrainFleet;
use crate::SimulationPlugin;

/// A runtime error parked by a system mid-tick, surfaced from `run` once
/// the tick completes.
#[derive(Resource, Default)]
pub struct SimFault(pub Option<SimError>);

pub struct Simulation {
    app: App,
}

impl Simulation {
    pub fn new(config: SimulationConfig, network: RailNetwork) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        if let Some(level) = config.log_level {
            app.add_plugins(LogPlugin {
                level,
                ..Default::default()
            });
        }

        // Ticks are driven through `run_schedule` only; park the built-in
        // fixed timestep where wall-clock accumulation can never reach it.
        app.insert_resource(Time::<Fixed>::from_seconds(1.0e9));

        app.insert_resource(SimClock::starting_at(config.dt, config.start_time));
        app.insert_resource(RecordStore::with_capacity(config.capacity));
        app.insert_resource(network);
        app.insert_resource(config);
        app.add_plugins(SimulationPlugin);

        // One update so plugin setup settles before the first tick.
        app.update();

        info!("simulation initialized");
        Self { app }
    }

    /// Register an arrival source. Generators run in registration order.
    pub fn add_customer_generator(&mut self, generator: CustomerGenerator) {
        self.app
            .world_mut()
            .resource_mut::<CustomerGenerators>()
            .generators
            .push(generator);
    }

    /// Schedule a disruption for the reserved event hook.
    pub fn schedule_disruption(&mut self, event: DisruptionEvent) {
        self.app
            .world_mut()
            .resource_mut::<crate::events::DisruptionQueue>()
            .pending
            .push(event);
    }

    /// Attach an auxiliary plugin, e.g. a persistence writer.
    pub fn add_plugins<M>(&mut self, plugins: impl bevy::app::Plugins<M>) {
        self.app.add_plugins(plugins);
    }

    /// Execute exactly one tick.
    pub fn step(&mut self) {
        self.app.world_mut().run_schedule(FixedUpdate);
    }

    /// Execute exactly `n` ticks, then flush the record store. A fault
    /// raised during a tick (record store exhaustion) aborts the run at
    /// the end of that tick.
    pub fn run(&mut self, n_ticks: u64) -> Result<(), SimError> {
        for _ in 0..n_ticks {
            self.step();
            if let Some(fault) = self.app.world_mut().resource_mut::<SimFault>().0.take() {
                return Err(fault);
            }
        }
        self.app.world_mut().resource_mut::<RecordStore>().flush();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn clock(&self) -> &SimClock {
        self.app.world().resource::<SimClock>()
    }

    pub fn record_store(&self) -> &RecordStore {
        self.app.world().resource::<RecordStore>()
    }

    pub fn network(&self) -> &RailNetwork {
        self.app.world().resource::<RailNetwork>()
    }

    pub fn fleet(&self) -> &TrainFleet {
        self.app.world().resource::<TrainFleet>()
    }

    pub fn metrics(&self) -> &[TickMetrics] {
        &self.app.world().resource::<MetricsHistory>().samples
    }

    pub fn last_metrics(&self) -> Option<TickMetrics> {
        self.metrics().last().copied()
    }
}
