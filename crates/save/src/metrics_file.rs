//! JSON export of the per-tick metrics history.

use simulation::metrics::TickMetrics;

use crate::atomic_write::atomic_write;
use crate::save_error::SaveError;

/// Write the samples as pretty-printed JSON.
pub fn write_metrics_json(path: &str, samples: &[TickMetrics]) -> Result<(), SaveError> {
    let json = serde_json::to_vec_pretty(samples)
        .map_err(|e| SaveError::Decode(e.to_string()))?;
    atomic_write(path, &json)?;
    Ok(())
}

/// Read a metrics file back.
pub fn read_metrics_json(path: &str) -> Result<Vec<TickMetrics>, SaveError> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| SaveError::Decode(e.to_string()))
}
