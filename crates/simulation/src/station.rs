//! Stations and their waiting queues.
//!
//! The waiting set is an ordered sequence of record-store indices; a
//! passenger in state WAITING sits in exactly one station's queue. Boarding
//! selection is path-aware: a dwelling train only pulls passengers whose
//! interned path actually rides that train's line out of this station.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::path_table::PathTable;
use crate::record_store::{PassengerState, RecordStore};
use crate::train::Train;

pub type StationId = u32;

/// How a station is identified at configuration time. String keys are
/// mapped to monotonically assigned integer ids when registered with the
/// network; integer keys are used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StationKey {
    Id(StationId),
    Name(String),
}

impl From<StationId> for StationKey {
    fn from(id: StationId) -> Self {
        StationKey::Id(id)
    }
}

impl From<&str> for StationKey {
    fn from(name: &str) -> Self {
        StationKey::Name(name.to_string())
    }
}

impl From<String> for StationKey {
    fn from(name: String) -> Self {
        StationKey::Name(name)
    }
}

impl std::fmt::Display for StationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StationKey::Id(id) => write!(f, "#{id}"),
            StationKey::Name(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Station {
    /// Key given at construction time, resolved by the network.
    pub key: StationKey,
    /// Integer id, assigned when the station is registered. 0 = unregistered.
    pub id: StationId,
    pub name: String,
    /// Codes of lines calling here. Auto-augmented when a line registers.
    pub line_codes: Vec<String>,
    /// Advisory queue size before overcrowding warnings start.
    pub theoretical_capacity: u32,
    pub maximum_capacity: u32,
    /// Average seconds to change platforms, reserved for transfer modelling.
    pub avg_change_time: f64,
    waiting: VecDeque<u32>,
}

impl Station {
    pub fn new(key: impl Into<StationKey>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            id: 0,
            name: name.into(),
            line_codes: Vec::new(),
            theoretical_capacity: 5_000,
            maximum_capacity: 10_000,
            avg_change_time: 60.0,
            waiting: VecDeque::new(),
        }
    }

    pub fn with_capacities(mut self, theoretical: u32, maximum: u32) -> Self {
        self.theoretical_capacity = theoretical;
        self.maximum_capacity = maximum;
        self
    }

    pub fn with_change_time(mut self, seconds: f64) -> Self {
        self.avg_change_time = seconds;
        self
    }

    // -------------------------------------------------------------------------
    // Waiting queue
    // -------------------------------------------------------------------------

    pub fn enqueue(&mut self, idx: u32) {
        self.waiting.push_back(idx);
        if self.waiting.len() as u32 > self.theoretical_capacity {
            warn!(
                "station {}: queue {} exceeds theoretical capacity {}",
                self.name,
                self.waiting.len(),
                self.theoretical_capacity
            );
        }
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }

    pub fn waiting_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.waiting.iter().copied()
    }

    /// Pull every waiting passenger whose path rides `train`'s line out of
    /// this station, preserving queue order. Passengers without an assigned
    /// path (`path_id == 0`) are never eligible. The returned indices are
    /// removed from the queue; anything the train cannot admit must be put
    /// back with [`requeue_front`](Self::requeue_front).
    pub fn dequeue_for_boarding(
        &mut self,
        train: &Train,
        store: &RecordStore,
        paths: &PathTable,
    ) -> Vec<u32> {
        if self.waiting.is_empty() {
            return Vec::new();
        }

        let station_id = self.id;
        let mut eligible = Vec::new();
        self.waiting.retain(|&idx| {
            let path_id = store.row(idx).path_id;
            if path_id == 0 {
                return true;
            }
            let rides_line = paths.expand(path_id).is_some_and(|segments| {
                segments
                    .iter()
                    .any(|s| s.from == station_id && s.line_code == train.line_code)
            });
            if rides_line {
                eligible.push(idx);
                false
            } else {
                true
            }
        });

        if !eligible.is_empty() {
            debug!(
                "station {}: {} of {} waiting eligible for train {}",
                self.name,
                eligible.len(),
                eligible.len() + self.waiting.len(),
                train.id
            );
        }
        eligible
    }

    /// Put not-admitted candidates back at the head of the queue, keeping
    /// their relative order, so they stay first in line for the next train.
    pub fn requeue_front(&mut self, indices: &[u32]) {
        for &idx in indices.iter().rev() {
            self.waiting.push_front(idx);
        }
    }

    /// Mark a passenger as changing lines here and put it back in the queue.
    pub fn transfer_passenger(&mut self, idx: u32, next_line: &str, store: &mut RecordStore) {
        let row = store.row_mut(idx);
        row.state = PassengerState::Transferring;
        row.current_station = self.id;
        row.on_train = 0;
        self.enqueue(idx);
        info!(
            "station {}: passenger {} transferring to line {}",
            self.name, idx, next_line
        );
    }
}

// =============================================================================
// Tests
// =============================================================================
