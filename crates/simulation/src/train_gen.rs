//! Per-line train dispatch policy.
//!
//! Dispatch is gated three ways: the service-hour window, the per-direction
//! headway guard, and the fleet cap. Train ids are recycled through an idle
//! pool; a line that never releases trains simply mints ids until the fleet
//! cap is reached and then stays saturated.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::config::MIN_SEGMENT_INTERVAL;
use crate::line::SchedulePolicy;
use crate::network::RailNetwork;
use crate::train::{Train, TrainFleet, TrainId};

/// A dispatch decision: one new train run, to be fitted with a timetable
/// by the owning line.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainMake {
    pub train_id: TrainId,
    pub line_id: String,
    pub direction: i8,
    pub depart_time: f64,
    pub max_capacity: u32,
}

fn direction_slot(direction: i8) -> usize {
    if direction >= 0 {
        0
    } else {
        1
    }
}

// =============================================================================
// TrainGenerator
// =============================================================================

#[derive(Debug, Clone)]
pub struct TrainGenerator {
    line_id: String,
    pub fleet_size: u32,
    schedule: SchedulePolicy,
    bidirectional: bool,
    active: HashSet<TrainId>,
    idle_pool: Vec<TrainId>,
    counter: u32,
    /// Per-line id namespace so ids stay unique across lines; assigned by
    /// the network when the line is registered.
    id_base: TrainId,
    /// Last departure per direction slot (+1, -1), -inf before the first.
    last_departure: [f64; 2],
}

impl TrainGenerator {
    pub fn new(
        line_id: impl Into<String>,
        fleet_size: u32,
        schedule: SchedulePolicy,
        bidirectional: bool,
    ) -> Self {
        let line_id = line_id.into();
        info!(
            "train generator for line {line_id}: fleet_size={fleet_size}, headway={}s, service_hours={:?}",
            schedule.headway, schedule.service_hours
        );
        Self {
            line_id,
            fleet_size,
            schedule,
            bidirectional,
            active: HashSet::new(),
            idle_pool: Vec::new(),
            counter: 0,
            id_base: 0,
            last_departure: [f64::NEG_INFINITY; 2],
        }
    }

    pub(crate) fn set_id_base(&mut self, base: TrainId) {
        self.id_base = base;
    }

    /// Decide which trains to make at `now`. Directions are tried in the
    /// fixed order `+1, -1` so that ties are deterministic.
    pub fn tick(&mut self, now: f64) -> Vec<TrainMake> {
        let mut makes = Vec::new();

        let hour = (now / 3600.0) % 24.0;
        let (start_h, end_h) = self.schedule.service_hours;
        if hour < start_h as f64 || hour >= end_h as f64 {
            debug!(
                "line {}: outside service hours (hour={hour:.1}, service={start_h}-{end_h})",
                self.line_id
            );
            return makes;
        }

        let directions: &[i8] = if self.bidirectional { &[1, -1] } else { &[1] };
        for &direction in directions {
            if (self.active.len() as u32) < self.fleet_size {
                let slot = direction_slot(direction);
                if now - self.last_departure[slot] >= self.schedule.headway {
                    if let Some(train_id) = self.allocate_train() {
                        makes.push(TrainMake {
                            train_id,
                            line_id: self.line_id.clone(),
                            direction,
                            depart_time: now,
                            max_capacity: self.schedule.capacity,
                        });
                        self.last_departure[slot] = now;
                        info!(
                            "line {}: making train {train_id} at {now:.1} direction {direction} (active: {}/{})",
                            self.line_id,
                            self.active.len(),
                            self.fleet_size
                        );
                    }
                }
            }
        }
        makes
    }

    /// Pop an id from the idle pool, or mint a new one while the fleet has
    /// room. `None` when the fleet is saturated.
    fn allocate_train(&mut self) -> Option<TrainId> {
        if let Some(train_id) = self.idle_pool.pop() {
            self.active.insert(train_id);
            return Some(train_id);
        }
        if (self.active.len() as u32) < self.fleet_size {
            self.counter += 1;
            let train_id = self.id_base + self.counter;
            self.active.insert(train_id);
            return Some(train_id);
        }
        warn!(
            "line {}: cannot allocate train, fleet at capacity ({})",
            self.line_id, self.fleet_size
        );
        None
    }

    /// Return a train id to the idle pool for later reuse.
    pub fn release(&mut self, train_id: TrainId) {
        self.active.remove(&train_id);
        self.idle_pool.push(train_id);
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn idle_count(&self) -> usize {
        self.idle_pool.len()
    }
}

// =============================================================================
// Dispatch system
// =============================================================================

/// Ask every line's generator for make events and turn them into trains.
/// Lines are visited in registration order; new trains enter the fleet in
/// make order and get their first `step` later in the same tick.
pub fn dispatch_trains(
    mut network: ResMut<RailNetwork>,
    mut fleet: ResMut<TrainFleet>,
    clock: Res<SimClock>,
) {
    let now = clock.time;
    for line in network.lines_mut() {
        let makes = line.generator.tick(now);
        for make in makes {
            let timetable = line.build_timetable(now, make.direction, MIN_SEGMENT_INTERVAL);
            fleet.active.push(Train::new(
                make.train_id,
                line.code.clone(),
                timetable,
                make.max_capacity,
                make.direction,
            ));
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
