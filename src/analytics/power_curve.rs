//! Binned wind-speed to power relationship.

use serde::Serialize;
use tracing::{debug, info};

use super::{mean, round_to, sample_std};
use crate::error::AnalysisError;
use crate::series::types::ScadaDataset;

const MAX_BIN_EDGE: f64 = 30.0;
/// A bin needs more samples than this to mark cut-in.
const CUT_IN_MIN_SAMPLES: usize = 5;
/// Mean bin power (kW) above which the turbine counts as producing.
const CUT_IN_MIN_POWER_KW: f64 = 10.0;
const RATED_FRACTION: f64 = 0.95;

/// Per-bin power statistics plus a short summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerCurve {
    /// Bin centres (m/s).
    pub wind_speed_bins: Vec<f64>,
    /// Mean power per bin (kW); `None` for empty bins.
    pub avg_power_per_bin: Vec<Option<f64>>,
    pub count_per_bin: Vec<usize>,
    /// Sample standard deviation per bin (kW); `None` below two samples.
    pub std_per_bin: Vec<Option<f64>>,
    pub summary: PowerCurveSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerCurveSummary {
    pub total_bins: usize,
    pub non_zero_bins: usize,
    pub max_power: f64,
    pub cut_in_speed: Option<f64>,
    pub rated_power: Option<f64>,
    pub total_records: usize,
}

/// Builds the power curve of a normalized SCADA dataset.
///
/// Bins are right-closed `(i, i + 1]` with the first bin also holding 0.
/// Edges run to `min(30, ceil(max) + 1)`; faster samples fall outside every
/// bin but still count toward `total_records` and `max_power`.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if the dataset is empty.
pub fn power_curve(scada: &ScadaDataset) -> Result<PowerCurve, AnalysisError> {
    if scada.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "no valid SCADA data for the power curve".to_string(),
        ));
    }

    let max_wind = scada
        .records
        .iter()
        .map(|r| r.wind_speed)
        .fold(0.0, f64::max);
    let num_bins = (max_wind.ceil() + 1.0).min(MAX_BIN_EDGE) as usize;

    let mut bins: Vec<Vec<f64>> = vec![Vec::new(); num_bins];
    for r in &scada.records {
        if r.wind_speed > num_bins as f64 {
            continue;
        }
        let bin = (r.wind_speed.ceil() as usize).saturating_sub(1);
        bins[bin].push(r.power);
    }

    let centers: Vec<f64> = (0..num_bins).map(|i| i as f64 + 0.5).collect();
    let counts: Vec<usize> = bins.iter().map(Vec::len).collect();
    let means: Vec<Option<f64>> = bins
        .iter()
        .map(|b| (!b.is_empty()).then(|| mean(b)))
        .collect();
    let stds: Vec<Option<f64>> = bins
        .iter()
        .map(|b| sample_std(b).map(|s| round_to(s, 2)))
        .collect();

    let max_power = scada.records.iter().map(|r| r.power).fold(0.0, f64::max);
    let cut_in_speed = means
        .iter()
        .zip(&counts)
        .position(|(m, &n)| n > CUT_IN_MIN_SAMPLES && m.is_some_and(|p| p > CUT_IN_MIN_POWER_KW))
        .map(|i| centers[i]);
    let rated_power = (max_power > 0.0
        && means
            .iter()
            .flatten()
            .any(|&p| p >= max_power * RATED_FRACTION))
    .then(|| round_to(max_power, 2));

    let non_zero_bins = counts.iter().filter(|&&n| n > 0).count();
    info!(
        non_zero_bins,
        total_bins = num_bins,
        max_power,
        "power curve generated"
    );
    if let Some(speed) = cut_in_speed {
        debug!(cut_in_speed = speed, "detected cut-in");
    }

    Ok(PowerCurve {
        wind_speed_bins: centers,
        avg_power_per_bin: means.into_iter().map(|m| m.map(|p| round_to(p, 2))).collect(),
        count_per_bin: counts,
        std_per_bin: stds,
        summary: PowerCurveSummary {
            total_bins: num_bins,
            non_zero_bins,
            max_power: round_to(max_power, 2),
            cut_in_speed,
            rated_power,
            total_records: scada.len(),
        },
    })
}
