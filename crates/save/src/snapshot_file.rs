//! Snapshot files and the writer plugin.
//!
//! A snapshot file is a header-wrapped, lz4-compressed bitcode encoding of
//! one [`Snapshot`]. The writer plugin follows the engine's snapshot phase
//! and drains anything new in `SnapshotHistory` to a configured directory,
//! one file per snapshot: `snapshot_tick_{N}.rsnap`.

use bevy::prelude::*;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};

use simulation::snapshot::{Snapshot, SnapshotHistory};
use simulation::SimulationSet;

use crate::atomic_write::atomic_write;
use crate::file_header::{unwrap_and_verify, wrap_with_header, FLAG_COMPRESSED};
use crate::save_error::SaveError;

/// Encode, compress and atomically write one snapshot. Returns the file
/// path that was written.
pub fn write_snapshot(directory: &str, snapshot: &Snapshot) -> Result<String, SaveError> {
    let payload = bitcode::encode(snapshot);
    let compressed = compress_prepend_size(&payload);
    let bytes = wrap_with_header(&compressed, FLAG_COMPRESSED, payload.len() as u32);

    let path = format!("{directory}/snapshot_tick_{}.rsnap", snapshot.tick);
    atomic_write(&path, &bytes)?;
    Ok(path)
}

/// Read a snapshot file back, verifying header and checksum.
pub fn read_snapshot(path: &str) -> Result<Snapshot, SaveError> {
    let bytes = std::fs::read(path)?;
    let (header, payload) = unwrap_and_verify(&bytes)?;

    let decoded = if header.flags & FLAG_COMPRESSED != 0 {
        decompress_size_prepended(payload).map_err(|e| SaveError::Decode(e.to_string()))?
    } else {
        payload.to_vec()
    };
    Ok(bitcode::decode(&decoded)?)
}

// =============================================================================
// Writer plugin
// =============================================================================

#[derive(Resource)]
pub struct SnapshotDirectory(pub String);

/// How many snapshots have already been written to disk.
#[derive(Resource, Default)]
struct SnapshotCursor(usize);

/// Writes every snapshot the engine takes into `directory`.
pub struct SnapshotWriterPlugin {
    pub directory: String,
}

impl Plugin for SnapshotWriterPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SnapshotDirectory(self.directory.clone()))
            .init_resource::<SnapshotCursor>()
            .add_systems(
                FixedUpdate,
                write_pending_snapshots.after(SimulationSet::Snapshot),
            );
    }
}

fn write_pending_snapshots(
    history: Res<SnapshotHistory>,
    directory: Res<SnapshotDirectory>,
    mut cursor: ResMut<SnapshotCursor>,
) {
    while cursor.0 < history.snapshots.len() {
        let snapshot = &history.snapshots[cursor.0];
        match write_snapshot(&directory.0, snapshot) {
            Ok(path) => info!("snapshot saved: {path}"),
            Err(err) => warn!("snapshot write failed: {err}"),
        }
        cursor.0 += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================
