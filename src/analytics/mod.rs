//! Descriptive statistics over normalized SCADA and meter data.
//!
//! These run independently of the AEP pipeline and share only its cleaning
//! rules. Every result type serializes to the JSON shape served by the API.

pub mod energy;
pub mod power_curve;
pub mod quality;
pub mod weibull;
pub mod wind;

pub use energy::{CapacityFactor, MonthlyEnergy, capacity_factor, monthly_energy};
pub use power_curve::{PowerCurve, PowerCurveSummary, power_curve};
pub use quality::{DataQualitySummary, DatasetQuality, data_quality_summary};
pub use weibull::{WeibullFit, weibull_fit};
pub use wind::{WindStatistics, wind_statistics};

/// Rounds to `decimals` decimal places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (`n - 1` denominator); `None` below two values.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Median, averaging the middle pair for even lengths.
pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
