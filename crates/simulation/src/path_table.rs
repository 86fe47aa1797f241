//! Deduplicated path storage.
//!
//! Millions of passengers share a handful of routes, so paths are stored
//! once and rows carry a 32-bit handle. Structural identity is decided by
//! a canonical byte encoding of the segment sequence; two plans with the
//! same segments always return the same `path_id`. Id 0 is reserved for
//! "no path found / unassigned".

use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::station::StationId;

pub type PathId = u32;

/// Atomic unit of a planned route: ride `line_code` from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub line_code: String,
    pub from: StationId,
    pub to: StationId,
}

impl Segment {
    pub fn new(line_code: impl Into<String>, from: StationId, to: StationId) -> Self {
        Self {
            line_code: line_code.into(),
            from,
            to,
        }
    }
}

#[derive(Resource, Default)]
pub struct PathTable {
    /// Segment lists, indexed by `path_id - 1`.
    paths: Vec<Vec<Segment>>,
    /// Canonical byte key -> path id.
    dedup: HashMap<Vec<u8>, PathId>,
}

impl PathTable {
    /// Intern a segment sequence, returning the existing id when the same
    /// sequence was planned before. Ids start at 1.
    pub fn plan(&mut self, origin: StationId, dest: StationId, segments: Vec<Segment>) -> PathId {
        let key = canonical_key(&segments);
        if let Some(&id) = self.dedup.get(&key) {
            debug!("path {origin}->{dest} already interned as {id}");
            return id;
        }

        self.paths.push(segments);
        let id = self.paths.len() as PathId;
        self.dedup.insert(key, id);
        debug!(
            "interned path {id}: {origin}->{dest} ({} segments)",
            self.paths[id as usize - 1].len()
        );
        id
    }

    /// Segments for a path id; `expand(0)` is `None`.
    pub fn expand(&self, path_id: PathId) -> Option<&[Segment]> {
        if path_id == 0 {
            return None;
        }
        self.paths.get(path_id as usize - 1).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Stable byte encoding of a segment sequence: length-prefixed line code
/// followed by little-endian endpoint ids, per segment.
fn canonical_key(segments: &[Segment]) -> Vec<u8> {
    let mut key = Vec::with_capacity(segments.len() * 16);
    for seg in segments {
        key.extend_from_slice(&(seg.line_code.len() as u32).to_le_bytes());
        key.extend_from_slice(seg.line_code.as_bytes());
        key.extend_from_slice(&seg.from.to_le_bytes());
        key.extend_from_slice(&seg.to.to_le_bytes());
    }
    key
}
