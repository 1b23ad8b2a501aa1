//! Wind-speed summary statistics and histogram.

use serde::Serialize;
use tracing::info;

use super::{mean, median, round_to, sample_std};
use crate::error::AnalysisError;
use crate::series::types::ScadaDataset;

/// Histogram edges never extend past this speed (m/s).
const MAX_BIN_EDGE: f64 = 30.0;

/// Wind-speed distribution summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindStatistics {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `0.0` for a single sample.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// 1 m/s bin edges starting at 0.
    pub histogram_bins: Vec<f64>,
    pub histogram_counts: Vec<usize>,
    pub bin_centers: Vec<f64>,
}

/// Summarizes the wind-speed column of a normalized SCADA dataset.
///
/// Bins are half-open `[i, i + 1)` except the last, which also includes its
/// right edge. Speeds beyond the last edge (above 30 m/s) are not counted.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if the dataset is empty.
pub fn wind_statistics(scada: &ScadaDataset) -> Result<WindStatistics, AnalysisError> {
    let speeds = scada.wind_speeds();
    if speeds.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "no valid wind speed data".to_string(),
        ));
    }

    let min = speeds.iter().copied().fold(f64::INFINITY, f64::min);
    let max = speeds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let last_edge = max.ceil().clamp(1.0, MAX_BIN_EDGE);
    let num_bins = last_edge as usize;

    let mut counts = vec![0usize; num_bins];
    for &ws in &speeds {
        if ws > last_edge {
            continue;
        }
        let bin = (ws.floor() as usize).min(num_bins - 1);
        counts[bin] += 1;
    }
    let edges: Vec<f64> = (0..=num_bins).map(|e| e as f64).collect();
    let centers: Vec<f64> = (0..num_bins).map(|i| i as f64 + 0.5).collect();

    let stats = WindStatistics {
        mean: round_to(mean(&speeds), 2),
        median: round_to(median(&speeds), 2),
        std: round_to(sample_std(&speeds).unwrap_or(0.0), 2),
        min: round_to(min, 2),
        max: round_to(max, 2),
        histogram_bins: edges,
        histogram_counts: counts,
        bin_centers: centers,
    };
    info!(
        records = speeds.len(),
        mean = stats.mean,
        bins = num_bins,
        "wind statistics computed"
    );
    Ok(stats)
}
