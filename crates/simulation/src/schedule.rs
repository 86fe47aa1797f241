//! Optional departure-schedule helper.
//!
//! Describes when trains leave a terminal either as a fixed frequency over
//! a window or as an explicit list of departure times. The two forms are
//! mutually exclusive; asking for both (or neither) is a construction
//! error. Lines use the headway policy for live dispatch — this helper is
//! for pre-computed schedules and analysis tooling.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartureSchedule {
    pub line: String,
    pub capacity: u32,
    /// Seconds between departures, exclusive with `departures`.
    pub frequency: Option<f64>,
    /// Explicit departure times, exclusive with `frequency`.
    pub departures: Option<Vec<f64>>,
    pub start_time: f64,
    pub end_time: f64,
}

impl DepartureSchedule {
    pub fn new(
        line: impl Into<String>,
        capacity: u32,
        frequency: Option<f64>,
        departures: Option<Vec<f64>>,
        start_time: f64,
        end_time: f64,
    ) -> Result<Self, SimError> {
        let line = line.into();
        match (&frequency, &departures) {
            (None, None) => {
                return Err(SimError::InvalidSchedule {
                    reason: format!("line {line}: must specify either frequency or departures"),
                })
            }
            (Some(_), Some(_)) => {
                return Err(SimError::InvalidSchedule {
                    reason: format!("line {line}: cannot specify both frequency and departures"),
                })
            }
            _ => {}
        }
        if let Some(f) = frequency {
            if f <= 0.0 {
                return Err(SimError::InvalidSchedule {
                    reason: format!("line {line}: non-positive frequency {f}"),
                });
            }
        }
        Ok(Self {
            line,
            capacity,
            frequency,
            departures,
            start_time,
            end_time,
        })
    }

    /// Sorted departure times covered by this schedule.
    pub fn departure_times(&self) -> Vec<f64> {
        if let Some(times) = &self.departures {
            let mut sorted = times.clone();
            sorted.sort_by(|a, b| a.total_cmp(b));
            return sorted;
        }
        // Validated at construction: exactly one of the two forms is set.
        let mut times = Vec::new();
        if let Some(frequency) = self.frequency {
            let mut at = self.start_time;
            while at <= self.end_time {
                times.push(at);
                at += frequency;
            }
        }
        times
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neither_form_rejected() {
        let err = DepartureSchedule::new("T1", 1000, None, None, 0.0, 3600.0).unwrap_err();
        assert!(matches!(err, SimError::InvalidSchedule { .. }));
    }

    #[test]
    fn test_both_forms_rejected() {
        let err =
            DepartureSchedule::new("T1", 1000, Some(600.0), Some(vec![0.0]), 0.0, 3600.0)
                .unwrap_err();
        assert!(matches!(err, SimError::InvalidSchedule { .. }));
    }

    #[test]
    fn test_frequency_expansion() {
        let schedule =
            DepartureSchedule::new("T1", 1000, Some(600.0), None, 0.0, 1800.0).unwrap();
        assert_eq!(schedule.departure_times(), vec![0.0, 600.0, 1200.0, 1800.0]);
    }

    #[test]
    fn test_explicit_departures_are_sorted() {
        let schedule =
            DepartureSchedule::new("T1", 1000, None, Some(vec![300.0, 0.0, 900.0]), 0.0, 3600.0)
                .unwrap();
        assert_eq!(schedule.departure_times(), vec![0.0, 300.0, 900.0]);
    }
}
