//! Per-vehicle state machine over a pre-built timetable.
//!
//! A train follows an ordered `(arrival_time, station_id)` timetable for
//! one run. Arrival starts a 30 s dwell during which the station feeds it
//! eligible passengers; at the terminal the update system reverses the
//! train and asks the line for a fresh timetable instead of mirroring the
//! old one, so the return run is scheduled from the actual reversal time.

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::config::{DWELL_SECONDS, MIN_SEGMENT_INTERVAL};
use crate::metrics::TickThroughput;
use crate::network::RailNetwork;
use crate::path_table::PathTable;
use crate::record_store::{PassengerState, RecordStore};
use crate::station::StationId;

pub type TrainId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainStatus {
    InService,
    Idle,
    OutOfService,
}

// =============================================================================
// Train
// =============================================================================

#[derive(Debug, Clone)]
pub struct Train {
    pub id: TrainId,
    pub line_code: String,
    /// +1 = forward along the line's station list, -1 = reverse.
    pub direction: i8,
    pub status: TrainStatus,
    pub max_capacity: u32,
    /// `(arrival_time, station_id)` stops for the current run.
    pub timetable: Vec<(f64, StationId)>,
    pub timetable_idx: usize,
    pub current_station: Option<StationId>,
    pub next_station: Option<StationId>,
    /// Seconds left of the stop at `current_station`.
    pub dwell_remaining: f64,
    /// Progress in `[0, 1]` between the current and next stop.
    pub position_ratio: f64,
    onboard: Vec<u32>,
}

impl Train {
    pub fn new(
        id: TrainId,
        line_code: impl Into<String>,
        timetable: Vec<(f64, StationId)>,
        max_capacity: u32,
        direction: i8,
    ) -> Self {
        let current_station = timetable.first().map(|&(_, s)| s);
        let next_station = timetable.get(1).map(|&(_, s)| s);
        Self {
            id,
            line_code: line_code.into(),
            direction,
            status: TrainStatus::InService,
            max_capacity,
            timetable,
            timetable_idx: 0,
            current_station,
            next_station,
            dwell_remaining: 0.0,
            position_ratio: 0.0,
            onboard: Vec::new(),
        }
    }

    pub fn occupancy(&self) -> u32 {
        self.onboard.len() as u32
    }

    pub fn onboard_indices(&self) -> &[u32] {
        &self.onboard
    }

    pub fn at_terminal(&self) -> bool {
        !self.timetable.is_empty() && self.timetable_idx + 1 == self.timetable.len()
    }

    /// Advance along the timetable by one tick. Returns `true` when the
    /// train arrived at a stop this tick.
    pub fn step(&mut self, dt: f64, now: f64) -> bool {
        if self.status != TrainStatus::InService || self.timetable.is_empty() {
            return false;
        }

        if self.dwell_remaining > 0.0 {
            self.dwell_remaining = (self.dwell_remaining - dt).max(0.0);
            return false;
        }

        // At the terminal with no dwell left: hold until the update system
        // turns the train around.
        if self.at_terminal() {
            return false;
        }

        let (current_arrival, _) = self.timetable[self.timetable_idx];
        let (next_arrival, next_station) = self.timetable[self.timetable_idx + 1];

        if now >= next_arrival {
            self.timetable_idx += 1;
            self.current_station = Some(next_station);
            self.next_station = self.timetable.get(self.timetable_idx + 1).map(|&(_, s)| s);
            self.dwell_remaining = DWELL_SECONDS;
            self.position_ratio = 0.0;
            return true;
        }

        if next_arrival > current_arrival {
            self.position_ratio = (now - current_arrival) / (next_arrival - current_arrival);
        }
        false
    }

    /// Drop every onboard passenger whose destination is the current stop.
    /// Alighted rows are marked ARRIVED; the caller releases their slots.
    pub fn alight(&mut self, store: &mut RecordStore) -> Vec<u32> {
        let Some(current) = self.current_station else {
            return Vec::new();
        };
        if self.onboard.is_empty() {
            return Vec::new();
        }

        let mut alighted = Vec::new();
        self.onboard.retain(|&idx| {
            if store.row(idx).dest_station == current {
                alighted.push(idx);
                false
            } else {
                true
            }
        });

        for &idx in &alighted {
            let row = store.row_mut(idx);
            row.state = PassengerState::Arrived;
            row.on_train = 0;
            row.current_station = current;
        }
        alighted
    }

    /// Admit a prefix of `candidates` up to the spare capacity. Rows are
    /// marked ONBOARD; candidates beyond capacity are NOT touched — the
    /// caller decides what happens to them.
    pub fn board(&mut self, candidates: &[u32], store: &mut RecordStore) -> Vec<u32> {
        let spare = (self.max_capacity - self.occupancy()) as usize;
        let take = candidates.len().min(spare);
        if take == 0 {
            return Vec::new();
        }

        let boarded = candidates[..take].to_vec();
        self.onboard.extend_from_slice(&boarded);
        for &idx in &boarded {
            let row = store.row_mut(idx);
            row.state = PassengerState::Onboard;
            row.on_train = self.id;
        }
        boarded
    }

    /// Flip direction and rewind the timetable pointer. The caller follows
    /// up with [`begin_run`](Self::begin_run) carrying a freshly built
    /// timetable for the return trip.
    pub fn reverse_direction(&mut self) {
        self.direction = -self.direction;
        self.timetable_idx = 0;
        self.position_ratio = 0.0;
    }

    /// Install the timetable for a new run.
    pub fn begin_run(&mut self, timetable: Vec<(f64, StationId)>) {
        self.current_station = timetable.first().map(|&(_, s)| s);
        self.next_station = timetable.get(1).map(|&(_, s)| s);
        self.timetable = timetable;
        self.timetable_idx = 0;
        self.position_ratio = 0.0;
    }
}

// =============================================================================
// Fleet resource and the per-tick update system
// =============================================================================

/// Every train ever dispatched, in insertion order. Trains are retained
/// indefinitely: at a terminal they reverse instead of being destroyed.
#[derive(Resource, Default)]
pub struct TrainFleet {
    pub active: Vec<Train>,
}

/// Step every train, then handle arrival side effects in the same pass:
/// alighting (tap-off + slot release), terminal reversal (rebuilt return
/// timetable, fresh dwell, no boarding that tick), and dwell boarding
/// (path-filtered candidates, tap-on, overflow back to the queue head).
pub fn update_trains(
    mut fleet: ResMut<TrainFleet>,
    mut network: ResMut<RailNetwork>,
    mut store: ResMut<RecordStore>,
    paths: Res<PathTable>,
    clock: Res<SimClock>,
    mut throughput: ResMut<TickThroughput>,
) {
    throughput.boarded = 0;
    throughput.alighted = 0;
    let now = clock.time;
    let dt = clock.dt;

    for train in fleet.active.iter_mut() {
        let arrived = train.step(dt, now);

        if !(arrived || train.dwell_remaining > 0.0) || train.current_station.is_none() {
            continue;
        }

        if arrived {
            let alighted = train.alight(&mut store);
            throughput.alighted += alighted.len() as u32;
            for &idx in &alighted {
                store.row_mut(idx).tap_off_ts = now;
                store.release(idx);
            }
            if !alighted.is_empty() {
                debug!(
                    "train {}: {} alighted at station {:?}, slots released",
                    train.id,
                    alighted.len(),
                    train.current_station
                );
            }
        }

        if arrived && train.at_terminal() {
            train.reverse_direction();
            if let Some(line) = network.line_by_code(&train.line_code) {
                let timetable = line.build_timetable(now, train.direction, MIN_SEGMENT_INTERVAL);
                train.begin_run(timetable);
            }
            train.status = TrainStatus::InService;
            train.dwell_remaining = DWELL_SECONDS;
            info!(
                "train {}: reversed at terminal, now direction {}",
                train.id, train.direction
            );
            // No boarding on the reversal tick; the dwell that follows
            // feeds passengers onto the return run.
            continue;
        }

        if train.dwell_remaining > 0.0 {
            let Some(station_id) = train.current_station else {
                continue;
            };
            if let Some(station) = network.station_mut(station_id) {
                let eligible = station.dequeue_for_boarding(train, &store, &paths);
                let boarded = train.board(&eligible, &mut store);
                throughput.boarded += boarded.len() as u32;
                for &idx in &boarded {
                    store.row_mut(idx).tap_on_ts = now;
                }
                if boarded.len() < eligible.len() {
                    station.requeue_front(&eligible[boarded.len()..]);
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
