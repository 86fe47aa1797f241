//! Packed on-disk layout of the record store.
//!
//! The file is a headerless packed array of passenger rows in native
//! endianness — one fixed-width record per slot, including free slots, so
//! a file can be mapped straight back into a store of the same capacity.
//! Reopening resets the allocator: `next_id` becomes the live-row count
//! plus one, the free stack starts empty, and fresh allocation resumes
//! after the last live slot.

use simulation::record_store::{PassengerRecord, PassengerState, RecordStore};

use crate::atomic_write::atomic_write;
use crate::save_error::SaveError;

/// Bytes per packed record: u64 id, four u32 station/train fields, u8
/// state, three f64 timestamps, u32 path id, two f64 accumulators and an
/// f32 speed.
pub const RECORD_BYTES: usize = 73;

fn encode_record(row: &PassengerRecord, out: &mut Vec<u8>) {
    out.extend_from_slice(&row.id.to_ne_bytes());
    out.extend_from_slice(&row.origin_station.to_ne_bytes());
    out.extend_from_slice(&row.dest_station.to_ne_bytes());
    out.extend_from_slice(&row.current_station.to_ne_bytes());
    out.extend_from_slice(&row.on_train.to_ne_bytes());
    out.push(row.state.as_u8());
    out.extend_from_slice(&row.tap_on_ts.to_ne_bytes());
    out.extend_from_slice(&row.tap_off_ts.to_ne_bytes());
    out.extend_from_slice(&row.spawn_ts.to_ne_bytes());
    out.extend_from_slice(&row.path_id.to_ne_bytes());
    out.extend_from_slice(&row.total_wait_time.to_ne_bytes());
    out.extend_from_slice(&row.total_travel_time.to_ne_bytes());
    out.extend_from_slice(&row.movement_speed.to_ne_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut buf = [0u8; N];
        buf.copy_from_slice(&self.bytes[self.offset..self.offset + N]);
        self.offset += N;
        buf
    }
}

fn decode_record(bytes: &[u8]) -> PassengerRecord {
    let mut reader = Reader { bytes, offset: 0 };
    PassengerRecord {
        id: u64::from_ne_bytes(reader.take()),
        origin_station: u32::from_ne_bytes(reader.take()),
        dest_station: u32::from_ne_bytes(reader.take()),
        current_station: u32::from_ne_bytes(reader.take()),
        on_train: u32::from_ne_bytes(reader.take()),
        state: PassengerState::from_u8(reader.take::<1>()[0]),
        tap_on_ts: f64::from_ne_bytes(reader.take()),
        tap_off_ts: f64::from_ne_bytes(reader.take()),
        spawn_ts: f64::from_ne_bytes(reader.take()),
        path_id: u32::from_ne_bytes(reader.take()),
        total_wait_time: f64::from_ne_bytes(reader.take()),
        total_travel_time: f64::from_ne_bytes(reader.take()),
        movement_speed: f32::from_ne_bytes(reader.take()),
    }
}

/// Write the whole store (all slots, live or not) to `path`.
pub fn flush_to(path: &str, store: &RecordStore) -> Result<(), SaveError> {
    let mut bytes = Vec::with_capacity(store.capacity() * RECORD_BYTES);
    for row in store.rows() {
        encode_record(row, &mut bytes);
    }
    atomic_write(path, &bytes)?;
    Ok(())
}

/// Open a packed record file, or create a fresh store of `capacity` slots
/// (and its file) when none exists. A reopened store takes its capacity
/// from the file and rebuilds the allocator per the reopen rule.
pub fn open_or_create(path: &str, capacity: usize) -> Result<RecordStore, SaveError> {
    if std::path::Path::new(path).exists() {
        let bytes = std::fs::read(path)?;
        if bytes.len() % RECORD_BYTES != 0 {
            return Err(SaveError::TruncatedFile { len: bytes.len() });
        }
        let slots = bytes.len() / RECORD_BYTES;
        let mut store = RecordStore::with_capacity(slots);
        for (i, chunk) in bytes.chunks_exact(RECORD_BYTES).enumerate() {
            store.rows_mut()[i] = decode_record(chunk);
        }
        store.rebuild_reopened();
        return Ok(store);
    }

    let store = RecordStore::with_capacity(capacity);
    flush_to(path, &store)?;
    Ok(store)
}
