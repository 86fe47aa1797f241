//! Optional persistence for the simulation engine.
//!
//! Four concerns live here, all outside the tick contract:
//! - atomic file writes (write-rename, crash-safe)
//! - a checksummed file header shared by the binary formats
//! - snapshot files (bitcode payload, lz4-compressed) plus a plugin that
//!   drains the engine's in-memory snapshot history to disk
//! - the packed record-store file with its reopen semantics
//! - per-tick metrics export as JSON

pub mod atomic_write;
pub mod file_header;
pub mod metrics_file;
pub mod record_file;
pub mod save_error;
pub mod snapshot_file;

pub use save_error::SaveError;
pub use snapshot_file::SnapshotWriterPlugin;
