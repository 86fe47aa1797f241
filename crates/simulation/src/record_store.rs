//! Pool-allocated passenger record store.
//!
//! A fixed-capacity array of passenger rows referenced everywhere else by
//! integer index: stations and trains hold indices, never rows. Released
//! slots go onto a LIFO free stack and are reused before any never-used
//! slot is touched. Row identity (`id`) is minted from a monotonic counter
//! and is never reused, so a recycled slot can't be confused with the
//! passenger that previously occupied it.

use bevy::prelude::*;

use crate::config::DEFAULT_CAPACITY;
use crate::error::SimError;

// =============================================================================
// Passenger rows
// =============================================================================

/// Passenger lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassengerState {
    #[default]
    Waiting,
    Onboard,
    Arrived,
    Transferring,
}

impl PassengerState {
    pub fn as_u8(self) -> u8 {
        match self {
            PassengerState::Waiting => 0,
            PassengerState::Onboard => 1,
            PassengerState::Arrived => 2,
            PassengerState::Transferring => 3,
        }
    }

    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => PassengerState::Onboard,
            2 => PassengerState::Arrived,
            3 => PassengerState::Transferring,
            _ => PassengerState::Waiting,
        }
    }
}

/// One passenger record. `id == 0` marks a free slot; the rest of the row
/// is zeroed on release.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PassengerRecord {
    pub id: u64,
    pub origin_station: u32,
    pub dest_station: u32,
    pub current_station: u32,
    /// Train currently carrying this passenger, 0 = none.
    pub on_train: u32,
    pub state: PassengerState,
    pub tap_on_ts: f64,
    pub tap_off_ts: f64,
    pub spawn_ts: f64,
    /// Handle into the path table, 0 = unassigned / no route found.
    pub path_id: u32,
    pub total_wait_time: f64,
    pub total_travel_time: f64,
    /// Meters per second, reserved for walking-time modelling.
    pub movement_speed: f32,
}

impl PassengerRecord {
    pub fn is_live(&self) -> bool {
        self.id > 0
    }
}

// =============================================================================
// Record store
// =============================================================================

#[derive(Resource)]
pub struct RecordStore {
    rows: Vec<PassengerRecord>,
    /// LIFO stack of released slot indices.
    free: Vec<u32>,
    /// First slot that has never been handed out.
    high_water: u32,
    next_id: u64,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl RecordStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: vec![PassengerRecord::default(); capacity],
            free: Vec::new(),
            high_water: 0,
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.rows.len()
    }

    /// Allocate `n` slots: the free stack is drained first (LIFO), then
    /// never-used slots are handed out in order. Fails atomically — either
    /// all `n` indices are returned or the store is untouched.
    pub fn allocate(&mut self, n: usize) -> Result<Vec<u32>, SimError> {
        let fresh_available = self.rows.len() - self.high_water as usize;
        if self.free.len() + fresh_available < n {
            warn!(
                "record store exhausted: requested {}, free={}, fresh={}",
                n,
                self.free.len(),
                fresh_available
            );
            return Err(SimError::CapacityExceeded {
                capacity: self.rows.len(),
            });
        }

        let mut indices = Vec::with_capacity(n);
        for _ in 0..n {
            if let Some(idx) = self.free.pop() {
                indices.push(idx);
            } else {
                indices.push(self.high_water);
                self.high_water += 1;
            }
        }
        Ok(indices)
    }

    /// Zero the row and push the slot onto the free stack.
    pub fn release(&mut self, idx: u32) {
        self.rows[idx as usize] = PassengerRecord::default();
        self.free.push(idx);
    }

    /// Mint the next passenger id. Ids start at 1 and are never reused.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn row(&self, idx: u32) -> &PassengerRecord {
        &self.rows[idx as usize]
    }

    pub fn row_mut(&mut self, idx: u32) -> &mut PassengerRecord {
        &mut self.rows[idx as usize]
    }

    pub fn rows(&self) -> &[PassengerRecord] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [PassengerRecord] {
        &mut self.rows
    }

    pub fn free_indices(&self) -> &[u32] {
        &self.free
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of live rows (`id > 0`).
    pub fn live_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_live()).count()
    }

    /// Iterate live rows with their slot index.
    pub fn iter_live(&self) -> impl Iterator<Item = (u32, &PassengerRecord)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_live())
            .map(|(i, r)| (i as u32, r))
    }

    /// The in-memory store has nothing to sync; the on-disk variant in the
    /// save crate flushes the packed file here.
    pub fn flush(&mut self) {
        debug!("record store flush ({} live rows)", self.live_count());
    }

    /// Reset allocator bookkeeping after rows were restored from a
    /// pre-existing packed file: `next_id` becomes one past the number of
    /// live rows, the free stack starts empty, and fresh allocation resumes
    /// after the last live slot. Zero-id holes below the high-water mark
    /// stay unused until something releases into them again.
    pub fn rebuild_reopened(&mut self) {
        let live = self.rows.iter().filter(|r| r.is_live()).count() as u64;
        self.next_id = live + 1;
        self.free.clear();
        self.high_water = self
            .rows
            .iter()
            .rposition(|r| r.is_live())
            .map(|i| i as u32 + 1)
            .unwrap_or(0);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sequential() {
        let mut store = RecordStore::with_capacity(10);
        let indices = store.allocate(3).unwrap();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_release_then_allocate_is_lifo() {
        let mut store = RecordStore::with_capacity(100);
        let indices = store.allocate(10).unwrap();
        for &idx in &indices[..5] {
            store.release(idx);
        }
        // Free stack pops in reverse release order.
        let reused = store.allocate(5).unwrap();
        assert_eq!(reused, vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_release_zeroes_row() {
        let mut store = RecordStore::with_capacity(10);
        let idx = store.allocate(1).unwrap()[0];
        let id = store.next_id();
        store.row_mut(idx).id = id;
        store.row_mut(idx).total_wait_time = 42.0;

        store.release(idx);
        assert_eq!(store.row(idx).id, 0);
        assert_eq!(store.row(idx).total_wait_time, 0.0);
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut store = RecordStore::with_capacity(4);
        store.allocate(4).unwrap();
        let err = store.allocate(1).unwrap_err();
        assert_eq!(err, SimError::CapacityExceeded { capacity: 4 });
    }

    #[test]
    fn test_allocate_fails_atomically() {
        let mut store = RecordStore::with_capacity(4);
        store.allocate(2).unwrap();
        assert!(store.allocate(3).is_err());
        // The failed call must not have consumed the remaining slots.
        assert_eq!(store.allocate(2).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_ids_monotonic_across_reuse() {
        let mut store = RecordStore::with_capacity(10);
        let idx = store.allocate(1).unwrap()[0];
        let first = store.next_id();
        store.row_mut(idx).id = first;
        store.release(idx);

        let idx2 = store.allocate(1).unwrap()[0];
        let second = store.next_id();
        assert_eq!(idx, idx2);
        assert!(second > first);
    }

    #[test]
    fn test_rebuild_reopened() {
        let mut store = RecordStore::with_capacity(10);
        let indices = store.allocate(4).unwrap();
        for &idx in &indices {
            let id = store.next_id();
            store.row_mut(idx).id = id;
        }
        // Simulate a hole left by a released slot.
        store.release(1);

        store.rebuild_reopened();
        assert_eq!(store.free_count(), 0);
        // Three live rows remain.
        assert_eq!(store.live_count(), 3);
        // Fresh allocation resumes after the last live slot.
        let next = store.allocate(1).unwrap()[0];
        assert_eq!(next, 4);
    }

    #[test]
    fn test_state_u8_roundtrip() {
        for state in [
            PassengerState::Waiting,
            PassengerState::Onboard,
            PassengerState::Arrived,
            PassengerState::Transferring,
        ] {
            assert_eq!(PassengerState::from_u8(state.as_u8()), state);
        }
    }
}
