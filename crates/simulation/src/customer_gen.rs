//! Poisson arrival sources that write new passenger rows.
//!
//! One generator per origin station, each with its own seeded `ChaCha8Rng`
//! so that runs are reproducible and generators can be added or removed
//! without disturbing each other's streams.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

use crate::clock::SimClock;
use crate::engine::SimFault;
use crate::error::SimError;
use crate::network::RailNetwork;
use crate::record_store::{PassengerRecord, PassengerState, RecordStore};
use crate::station::StationId;

// =============================================================================
// Arrival profiles
// =============================================================================

/// Arrivals-per-second as a function of simulated time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrivalProfile {
    /// Flat rate at all hours.
    Constant { rate: f64 },
    /// Base rate plus a Gaussian peak centred on an hour of the day.
    DailyPeak {
        base: f64,
        peak: f64,
        peak_hour: f64,
        spread: f64,
    },
}

impl ArrivalProfile {
    pub fn rate_at(&self, t: f64) -> f64 {
        match self {
            ArrivalProfile::Constant { rate } => *rate,
            ArrivalProfile::DailyPeak {
                base,
                peak,
                peak_hour,
                spread,
            } => {
                let hour = (t / 3600.0) % 24.0;
                let bump = peak * (-0.5 * ((hour - peak_hour) / spread).powi(2)).exp();
                base + bump
            }
        }
    }
}

// =============================================================================
// Customer generator
// =============================================================================

pub struct CustomerGenerator {
    pub station_id: StationId,
    profile: ArrivalProfile,
    rng: ChaCha8Rng,
}

impl CustomerGenerator {
    pub fn new(station_id: StationId, profile: ArrivalProfile, seed: u64) -> Self {
        info!("customer generator for station {station_id} (seed {seed})");
        Self {
            station_id,
            profile,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draw this tick's arrivals and write their rows. Returns the new
    /// slot indices; paths are assigned by the routing phase afterwards.
    pub fn generate(
        &mut self,
        t: f64,
        dt: f64,
        candidates: &[StationId],
        store: &mut RecordStore,
    ) -> Result<Vec<u32>, SimError> {
        let lambda = self.profile.rate_at(t) * dt;
        if lambda <= 0.0 || candidates.is_empty() {
            return Ok(Vec::new());
        }
        let Ok(poisson) = Poisson::new(lambda) else {
            return Ok(Vec::new());
        };
        let n = poisson.sample(&mut self.rng) as usize;
        if n == 0 {
            return Ok(Vec::new());
        }

        let indices = store.allocate(n)?;
        for &idx in &indices {
            let id = store.next_id();
            let dest = candidates[self.rng.gen_range(0..candidates.len())];
            let movement_speed = self.rng.gen_range(1.0f32..1.5f32);
            *store.row_mut(idx) = PassengerRecord {
                id,
                origin_station: self.station_id,
                dest_station: dest,
                current_station: self.station_id,
                on_train: 0,
                state: PassengerState::Waiting,
                tap_on_ts: 0.0,
                tap_off_ts: 0.0,
                spawn_ts: t,
                path_id: 0,
                total_wait_time: 0.0,
                total_travel_time: 0.0,
                movement_speed,
            };
        }
        debug!(
            "station {}: created {n} passengers (rate*dt={lambda:.2})",
            self.station_id
        );
        Ok(indices)
    }
}

/// All registered generators, visited in registration order.
#[derive(Resource, Default)]
pub struct CustomerGenerators {
    pub generators: Vec<CustomerGenerator>,
}

/// Slot indices created during the current tick's generation phase.
#[derive(Resource, Default)]
pub struct FreshArrivals {
    pub indices: Vec<u32>,
}

// =============================================================================
// Generation system
// =============================================================================

/// Run every generator for this tick. Candidate destinations are all
/// registered stations except the generator's own, in registration order —
/// zero-length trips never enter the system. A full record store parks a
/// `CapacityExceeded` fault which aborts the run after this tick.
pub fn generate_customers(
    mut generators: ResMut<CustomerGenerators>,
    mut store: ResMut<RecordStore>,
    network: Res<RailNetwork>,
    clock: Res<SimClock>,
    mut fresh: ResMut<FreshArrivals>,
    mut fault: ResMut<SimFault>,
) {
    fresh.indices.clear();
    if fault.0.is_some() {
        return;
    }

    for generator in &mut generators.generators {
        let candidates: Vec<StationId> = network
            .station_ids()
            .iter()
            .copied()
            .filter(|&s| s != generator.station_id)
            .collect();

        match generator.generate(clock.time, clock.dt, &candidates, &mut store) {
            Ok(indices) => fresh.indices.extend(indices),
            Err(err) => {
                warn!("generation aborted: {err}");
                fault.0 = Some(err);
                return;
            }
        }
    }

    if !fresh.indices.is_empty() {
        debug!("generated {} new passengers", fresh.indices.len());
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_profile() {
        let profile = ArrivalProfile::Constant { rate: 0.2 };
        assert_eq!(profile.rate_at(0.0), 0.2);
        assert_eq!(profile.rate_at(86_400.0), 0.2);
    }

    #[test]
    fn test_daily_peak_profile_peaks_at_peak_hour() {
        let profile = ArrivalProfile::DailyPeak {
            base: 0.1,
            peak: 1.0,
            peak_hour: 8.0,
            spread: 1.5,
        };
        let at_peak = profile.rate_at(8.0 * 3600.0);
        let off_peak = profile.rate_at(3.0 * 3600.0);
        assert!((at_peak - 1.1).abs() < 1e-9);
        assert!(off_peak < at_peak);
        assert!(off_peak >= 0.1);
    }

    #[test]
    fn test_generate_writes_waiting_rows() {
        let mut store = RecordStore::with_capacity(1000);
        let mut generator =
            CustomerGenerator::new(1, ArrivalProfile::Constant { rate: 5.0 }, 42);

        let mut produced = Vec::new();
        for tick in 0..20 {
            let indices = generator
                .generate(tick as f64, 1.0, &[2, 3], &mut store)
                .unwrap();
            produced.extend(indices);
        }
        assert!(!produced.is_empty());

        for &idx in &produced {
            let row = store.row(idx);
            assert!(row.id > 0);
            assert_eq!(row.origin_station, 1);
            assert!(row.dest_station == 2 || row.dest_station == 3);
            assert_eq!(row.current_station, 1);
            assert_eq!(row.state, PassengerState::Waiting);
            assert_eq!(row.path_id, 0);
            assert!(row.movement_speed >= 1.0 && row.movement_speed < 1.5);
        }
    }

    #[test]
    fn test_generate_no_candidates_is_empty() {
        let mut store = RecordStore::with_capacity(10);
        let mut generator =
            CustomerGenerator::new(1, ArrivalProfile::Constant { rate: 5.0 }, 42);
        let indices = generator.generate(0.0, 1.0, &[], &mut store).unwrap();
        assert!(indices.is_empty());
    }

    #[test]
    fn test_generate_zero_rate_is_empty() {
        let mut store = RecordStore::with_capacity(10);
        let mut generator =
            CustomerGenerator::new(1, ArrivalProfile::Constant { rate: 0.0 }, 42);
        let indices = generator.generate(0.0, 1.0, &[2], &mut store).unwrap();
        assert!(indices.is_empty());
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut store_a = RecordStore::with_capacity(1000);
        let mut store_b = RecordStore::with_capacity(1000);
        let mut gen_a = CustomerGenerator::new(1, ArrivalProfile::Constant { rate: 2.0 }, 7);
        let mut gen_b = CustomerGenerator::new(1, ArrivalProfile::Constant { rate: 2.0 }, 7);

        for tick in 0..10 {
            let a = gen_a
                .generate(tick as f64, 1.0, &[2, 3], &mut store_a)
                .unwrap();
            let b = gen_b
                .generate(tick as f64, 1.0, &[2, 3], &mut store_b)
                .unwrap();
            assert_eq!(a, b);
        }
        for (a, b) in store_a.rows().iter().zip(store_b.rows()) {
            assert_eq!(a.dest_station, b.dest_station);
            assert_eq!(a.movement_speed, b.movement_speed);
        }
    }

    #[test]
    fn test_capacity_exhaustion_propagates() {
        let mut store = RecordStore::with_capacity(2);
        let mut generator =
            CustomerGenerator::new(1, ArrivalProfile::Constant { rate: 50.0 }, 42);
        let mut failed = false;
        for tick in 0..10 {
            if generator
                .generate(tick as f64, 1.0, &[2], &mut store)
                .is_err()
            {
                failed = true;
                break;
            }
        }
        assert!(failed);
    }
}
