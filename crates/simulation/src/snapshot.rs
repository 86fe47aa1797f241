//! Periodic snapshots of every live passenger.
//!
//! The engine only collects snapshots into an in-memory history; writing
//! them to disk is the save crate's business. Schema and trigger (every
//! `snapshot_interval` ticks) are the contract, the file format is not.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::clock::SimClock;
use crate::config::SimulationConfig;
use crate::record_store::RecordStore;

/// One live passenger at snapshot time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct SnapshotRow {
    pub id: u64,
    pub origin_station_id: u32,
    pub dest_station_id: u32,
    pub current_station_id: u32,
    pub on_train_id: u32,
    pub state: u8,
    pub total_wait_time: f64,
    pub total_travel_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Snapshot {
    pub tick: u64,
    pub rows: Vec<SnapshotRow>,
}

#[derive(Resource, Default)]
pub struct SnapshotHistory {
    pub snapshots: Vec<Snapshot>,
}

/// Capture every live row when the tick hits the snapshot interval.
pub fn take_snapshot(
    config: Res<SimulationConfig>,
    clock: Res<SimClock>,
    store: Res<RecordStore>,
    mut history: ResMut<SnapshotHistory>,
) {
    if config.snapshot_interval == 0 || clock.tick % config.snapshot_interval != 0 {
        return;
    }

    let rows: Vec<SnapshotRow> = store
        .iter_live()
        .map(|(_, row)| SnapshotRow {
            id: row.id,
            origin_station_id: row.origin_station,
            dest_station_id: row.dest_station,
            current_station_id: row.current_station,
            on_train_id: row.on_train,
            state: row.state.as_u8(),
            total_wait_time: row.total_wait_time,
            total_travel_time: row.total_travel_time,
        })
        .collect();

    info!(
        "snapshot at tick {}: {} live passengers",
        clock.tick,
        rows.len()
    );
    history.snapshots.push(Snapshot {
        tick: clock.tick,
        rows,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_bitcode_roundtrip() {
        let snapshot = Snapshot {
            tick: 3600,
            rows: vec![SnapshotRow {
                id: 17,
                origin_station_id: 1,
                dest_station_id: 3,
                current_station_id: 2,
                on_train_id: 10_001,
                state: 1,
                total_wait_time: 42.0,
                total_travel_time: 0.0,
            }],
        };
        let bytes = bitcode::encode(&snapshot);
        let back: Snapshot = bitcode::decode(&bytes).unwrap();
        assert_eq!(back, snapshot);
    }
}
