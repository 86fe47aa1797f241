//! Lines: ordered station sequences with per-segment travel times and a
//! dispatch policy.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::station::{StationId, StationKey};
use crate::train_gen::TrainGenerator;

/// When and how densely a line runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePolicy {
    /// Minimum seconds between departures in the same direction.
    pub headway: f64,
    /// `[start_h, end_h)` hours-of-day during which dispatch is permitted.
    pub service_hours: (u32, u32),
    /// Passenger capacity of each train on this line.
    pub capacity: u32,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            headway: 600.0,
            service_hours: (0, 24),
            capacity: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Line {
    pub id: String,
    pub code: String,
    /// Station keys as given at construction; resolved by the network.
    pub(crate) stops_spec: Vec<StationKey>,
    /// Resolved station ids, filled in when the line is registered.
    pub stops: Vec<StationId>,
    /// Forward travel time of each segment, `len == stops - 1`.
    pub segment_times: Vec<f64>,
    pub schedule: SchedulePolicy,
    pub fleet_size: u32,
    pub bidirectional: bool,
    pub(crate) generator: TrainGenerator,
}

impl Line {
    /// Build a line. The stop list and segment times are validated here;
    /// station existence is checked when the line is added to a network.
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        stops: Vec<StationKey>,
        segment_times: Vec<f64>,
        schedule: SchedulePolicy,
        fleet_size: u32,
        bidirectional: bool,
    ) -> Result<Self, SimError> {
        let id = id.into();
        let code = code.into();

        if stops.len() < 2 {
            return Err(SimError::InvalidSchedule {
                reason: format!("line {code}: needs at least 2 stations, got {}", stops.len()),
            });
        }
        if segment_times.len() != stops.len() - 1 {
            return Err(SimError::InvalidSchedule {
                reason: format!(
                    "line {code}: {} segment times for {} stations (expected {})",
                    segment_times.len(),
                    stops.len(),
                    stops.len() - 1
                ),
            });
        }
        if let Some(bad) = segment_times.iter().find(|&&t| t <= 0.0) {
            return Err(SimError::InvalidSchedule {
                reason: format!("line {code}: non-positive segment time {bad}"),
            });
        }

        let generator = TrainGenerator::new(id.clone(), fleet_size, schedule.clone(), bidirectional);
        Ok(Self {
            id,
            code,
            stops_spec: stops,
            stops: Vec::new(),
            segment_times,
            schedule,
            fleet_size,
            bidirectional,
            generator,
        })
    }

    /// The next station along the route in `direction`, if any.
    pub fn next_station_on(&self, current: StationId, direction: i8) -> Option<StationId> {
        let idx = self.stops.iter().position(|&s| s == current)?;
        let next = idx as i64 + direction as i64;
        if next < 0 {
            return None;
        }
        self.stops.get(next as usize).copied()
    }

    /// Travel time between two adjacent stations, in either order.
    pub fn travel_time_between(&self, from: StationId, to: StationId) -> Option<f64> {
        let from_idx = self.stops.iter().position(|&s| s == from)?;
        let to_idx = self.stops.iter().position(|&s| s == to)?;
        if from_idx.abs_diff(to_idx) != 1 {
            return None;
        }
        self.segment_times.get(from_idx.min(to_idx)).copied()
    }

    /// `(terminal_station, direction)` pairs for both ends of the line.
    pub fn terminals(&self) -> Vec<(StationId, i8)> {
        if self.stops.len() < 2 {
            return Vec::new();
        }
        vec![(self.stops[0], 1), (self.stops[self.stops.len() - 1], -1)]
    }

    /// Timetable for one run starting at `start`: each stop is scheduled
    /// `max(segment_time, min_interval)` after the previous one.
    pub fn build_timetable(
        &self,
        start: f64,
        direction: i8,
        min_interval: f64,
    ) -> Vec<(f64, StationId)> {
        let stops: Vec<StationId> = if direction >= 0 {
            self.stops.clone()
        } else {
            self.stops.iter().rev().copied().collect()
        };
        let times: Vec<f64> = if direction >= 0 {
            self.segment_times.clone()
        } else {
            self.segment_times.iter().rev().copied().collect()
        };

        let mut timetable = Vec::with_capacity(stops.len());
        let mut at = start;
        if let Some(&first) = stops.first() {
            timetable.push((at, first));
        }
        for (i, &travel) in times.iter().enumerate() {
            at += travel.max(min_interval);
            timetable.push((at, stops[i + 1]));
        }

        debug!(
            "line {}: built timetable with {} stops, direction={direction}, total={:.1}s",
            self.code,
            timetable.len(),
            at - start
        );
        timetable
    }

    /// Resize the fleet, keeping the dispatch policy in sync.
    pub fn update_fleet(&mut self, new_size: u32) {
        self.fleet_size = new_size;
        self.generator.fleet_size = new_size;
    }
}
