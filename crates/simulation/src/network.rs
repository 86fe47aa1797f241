//! The rail network: station registry, lines, and the routing multigraph.
//!
//! Each line contributes one undirected edge per adjacent station pair,
//! weighted by its segment travel time and tagged with its line code.
//! Parallel edges from different lines coexist; shortest-path planning uses
//! the cheapest parallel edge per hop, and segment reconstruction breaks
//! parallel-edge ties by picking the line code that sorts first, which
//! keeps planning fully deterministic.

use std::collections::{BTreeMap, HashMap};

use bevy::prelude::*;
use pathfinding::prelude::dijkstra;

use crate::error::SimError;
use crate::line::Line;
use crate::path_table::{PathId, PathTable, Segment};
use crate::record_store::RecordStore;
use crate::station::{Station, StationId, StationKey};

/// One directed half of a line's segment in the routing graph.
#[derive(Debug, Clone)]
pub struct RailEdge {
    pub to: StationId,
    pub travel_time: f64,
    pub line_code: String,
}

#[derive(Resource)]
pub struct RailNetwork {
    stations: HashMap<StationId, Station>,
    /// Registration order; also the deterministic candidate-destination order.
    station_order: Vec<StationId>,
    lines: Vec<Line>,
    name_ids: HashMap<String, StationId>,
    next_station_id: StationId,
    /// Adjacency lists, rebuilt whenever a line is added.
    edges: HashMap<StationId, Vec<RailEdge>>,
}

impl Default for RailNetwork {
    fn default() -> Self {
        Self {
            stations: HashMap::new(),
            station_order: Vec::new(),
            lines: Vec::new(),
            name_ids: HashMap::new(),
            next_station_id: 1,
            edges: HashMap::new(),
        }
    }
}

impl RailNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register a station. Integer keys are used verbatim; string keys get
    /// the next monotonically assigned integer id. Re-registering an
    /// existing key replaces the station data but keeps its id.
    pub fn add_station(&mut self, mut station: Station) -> StationId {
        let id = match &station.key {
            StationKey::Id(id) => *id,
            StationKey::Name(name) => {
                if let Some(&existing) = self.name_ids.get(name) {
                    existing
                } else {
                    // Skip ids already claimed by explicit integer keys.
                    while self.stations.contains_key(&self.next_station_id) {
                        self.next_station_id += 1;
                    }
                    let assigned = self.next_station_id;
                    self.next_station_id += 1;
                    self.name_ids.insert(name.clone(), assigned);
                    debug!("registered station id mapping: '{name}' -> {assigned}");
                    assigned
                }
            }
        };

        station.id = id;
        if !self.stations.contains_key(&id) {
            self.station_order.push(id);
        }
        info!("added station '{}' (id {id}) to network", station.name);
        self.stations.insert(id, station);
        id
    }

    /// Register a line. Every referenced station must already exist —
    /// an unknown reference aborts with `UnknownStation`. The line's code
    /// is appended to each member station's declared-line list, and train
    /// ids for the line get their own namespace.
    pub fn add_line(&mut self, mut line: Line) -> Result<(), SimError> {
        let mut stops = Vec::with_capacity(line.stops_spec.len());
        for key in &line.stops_spec {
            let id = match key {
                StationKey::Id(id) if self.stations.contains_key(id) => *id,
                StationKey::Name(name) => match self.name_ids.get(name) {
                    Some(&id) => id,
                    None => {
                        return Err(SimError::UnknownStation {
                            station: key.to_string(),
                        })
                    }
                },
                key => {
                    return Err(SimError::UnknownStation {
                        station: key.to_string(),
                    })
                }
            };
            stops.push(id);
        }
        line.stops = stops;

        for &station_id in &line.stops {
            if let Some(station) = self.stations.get_mut(&station_id) {
                if !station.line_codes.contains(&line.code) {
                    station.line_codes.push(line.code.clone());
                }
            }
        }

        line.generator
            .set_id_base((self.lines.len() as u32 + 1) * 10_000);
        info!(
            "added line {} to network with stations {:?}",
            line.code, line.stops
        );
        self.lines.push(line);
        self.rebuild_edges();
        Ok(())
    }

    fn rebuild_edges(&mut self) {
        self.edges.clear();
        for line in &self.lines {
            for (i, pair) in line.stops.windows(2).enumerate() {
                let (a, b) = (pair[0], pair[1]);
                let travel_time = line.segment_times[i];
                for (from, to) in [(a, b), (b, a)] {
                    self.edges.entry(from).or_default().push(RailEdge {
                        to,
                        travel_time,
                        line_code: line.code.clone(),
                    });
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    pub fn station_mut(&mut self, id: StationId) -> Option<&mut Station> {
        self.stations.get_mut(&id)
    }

    pub fn station_id_for(&self, name: &str) -> Option<StationId> {
        self.name_ids.get(name).copied()
    }

    /// Station ids in registration order.
    pub fn station_ids(&self) -> &[StationId] {
        &self.station_order
    }

    pub fn stations_in_order(&self) -> impl Iterator<Item = &Station> {
        self.station_order
            .iter()
            .filter_map(|id| self.stations.get(id))
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut Line> {
        self.lines.iter_mut()
    }

    pub fn line_by_code(&self, code: &str) -> Option<&Line> {
        self.lines.iter().find(|l| l.code == code)
    }

    /// Lines calling at a station — the transfer options there.
    pub fn transfer_options(&self, station_id: StationId) -> Vec<String> {
        self.stations
            .get(&station_id)
            .map(|s| s.line_codes.clone())
            .unwrap_or_default()
    }

    /// Total waiting passengers across all stations.
    pub fn total_waiting(&self) -> usize {
        self.stations.values().map(|s| s.waiting_count()).sum()
    }

    // -------------------------------------------------------------------------
    // Routing
    // -------------------------------------------------------------------------

    /// Shortest path by summed travel time, interned into the path table.
    /// Returns 0 when no route exists (the passenger stays queued forever
    /// and shows up in the waiting metrics).
    pub fn find_path(
        &self,
        paths: &mut PathTable,
        origin: StationId,
        dest: StationId,
    ) -> PathId {
        if origin == dest {
            debug!("zero-length trip {origin}->{dest} not planned");
            return 0;
        }

        let result = dijkstra(
            &origin,
            |&node| {
                // Cheapest parallel edge per neighbour, in id order.
                let mut best: BTreeMap<StationId, u64> = BTreeMap::new();
                for edge in self.edges.get(&node).into_iter().flatten() {
                    let cost = (edge.travel_time * 1000.0).round() as u64;
                    best.entry(edge.to)
                        .and_modify(|c| *c = (*c).min(cost))
                        .or_insert(cost);
                }
                best.into_iter().collect::<Vec<_>>()
            },
            |&node| node == dest,
        );

        let Some((nodes, _cost)) = result else {
            warn!("no path found from station {origin} to {dest}");
            return 0;
        };

        let mut segments = Vec::with_capacity(nodes.len().saturating_sub(1));
        for pair in nodes.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let line_code = self
                .edges
                .get(&a)
                .into_iter()
                .flatten()
                .filter(|e| e.to == b)
                .map(|e| e.line_code.as_str())
                .min();
            match line_code {
                Some(code) => segments.push(Segment::new(code, a, b)),
                None => {
                    warn!("route {origin}->{dest} crosses a missing edge {a}->{b}");
                    return 0;
                }
            }
        }
        paths.plan(origin, dest, segments)
    }

    /// Plan a route for the record at `idx` and write the handle back.
    pub fn assign_path_to_record(
        &self,
        paths: &mut PathTable,
        store: &mut RecordStore,
        idx: u32,
    ) {
        let (origin, dest) = {
            let row = store.row(idx);
            (row.origin_station, row.dest_station)
        };
        let path_id = self.find_path(paths, origin, dest);
        store.row_mut(idx).path_id = path_id;
    }
}

// =============================================================================
// Routing-phase system
// =============================================================================

/// Give every passenger generated this tick a path and put it in its
/// origin station's queue.
pub fn assign_paths_and_enqueue(
    fresh: Res<crate::customer_gen::FreshArrivals>,
    mut store: ResMut<RecordStore>,
    mut network: ResMut<RailNetwork>,
    mut paths: ResMut<PathTable>,
) {
    for &idx in &fresh.indices {
        network.assign_path_to_record(&mut paths, &mut store, idx);
        let origin = store.row(idx).origin_station;
        if let Some(station) = network.station_mut(origin) {
            station.enqueue(idx);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
