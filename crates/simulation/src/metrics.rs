//! Per-tick operational metrics.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::clock::SimClock;
use crate::record_store::{PassengerState, RecordStore};
use crate::train::TrainFleet;

/// One sample per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickMetrics {
    pub tick: u64,
    /// Passengers boarded this tick, per second.
    pub boarding_rate: f64,
    /// Passengers alighted this tick, per second.
    pub alight_rate: f64,
    /// Mean accumulated wait over currently-waiting rows; 0 when none.
    /// Completed journeys do not contribute.
    pub avg_wait_time: f64,
    pub active_trains: u32,
    pub waiting_passengers: u32,
}

#[derive(Resource, Default)]
pub struct MetricsHistory {
    pub samples: Vec<TickMetrics>,
}

/// Boarding/alighting counters for the current tick, reset by the train
/// update pass.
#[derive(Resource, Default)]
pub struct TickThroughput {
    pub boarded: u32,
    pub alighted: u32,
}

/// Charge `dt` of wait time to every live WAITING row.
pub fn accumulate_wait_times(mut store: ResMut<RecordStore>, clock: Res<SimClock>) {
    let dt = clock.dt;
    for row in store.rows_mut() {
        if row.id > 0 && row.state == PassengerState::Waiting {
            row.total_wait_time += dt;
        }
    }
}

/// Scan the store and record this tick's sample.
pub fn collect_metrics(
    store: Res<RecordStore>,
    fleet: Res<TrainFleet>,
    clock: Res<SimClock>,
    throughput: Res<TickThroughput>,
    mut history: ResMut<MetricsHistory>,
) {
    let mut waiting = 0u32;
    let mut wait_sum = 0.0;
    for (_, row) in store.iter_live() {
        if row.state == PassengerState::Waiting {
            waiting += 1;
            wait_sum += row.total_wait_time;
        }
    }
    let avg_wait_time = if waiting > 0 {
        wait_sum / waiting as f64
    } else {
        0.0
    };

    let dt = clock.dt;
    let sample = TickMetrics {
        tick: clock.tick,
        boarding_rate: if dt > 0.0 {
            throughput.boarded as f64 / dt
        } else {
            0.0
        },
        alight_rate: if dt > 0.0 {
            throughput.alighted as f64 / dt
        } else {
            0.0
        },
        avg_wait_time,
        active_trains: fleet.active.len() as u32,
        waiting_passengers: waiting,
    };

    if clock.tick % 100 == 0 {
        info!(
            "metrics: {} trains, {} waiting, boarding_rate={:.2}, alight_rate={:.2}",
            sample.active_trains, sample.waiting_passengers, sample.boarding_rate, sample.alight_rate
        );
    }
    history.samples.push(sample);
}
