//! Meter-based production metrics: monthly totals and capacity factor.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};

use super::round_to;
use crate::error::AnalysisError;
use crate::series::types::MeterDataset;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Capacities above 1 GW are accepted but flagged.
const CAPACITY_SANITY_KW: f64 = 1_000_000.0;

/// Energy delivered in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyEnergy {
    /// `YYYY-MM`.
    pub month: String,
    /// MWh.
    pub energy: f64,
    /// Days between the first and last reading of the month, inclusive.
    pub days: i64,
    /// MWh per day.
    pub avg_daily: f64,
    pub records: usize,
}

/// Sums meter energy per calendar month.
///
/// Months whose total is zero are left out.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if no month has any energy.
pub fn monthly_energy(meter: &MeterDataset) -> Result<Vec<MonthlyEnergy>, AnalysisError> {
    struct Bucket {
        energy_kwh: f64,
        records: usize,
        first: NaiveDateTime,
        last: NaiveDateTime,
    }

    let mut months: BTreeMap<(i32, u32), Bucket> = BTreeMap::new();
    for r in &meter.records {
        months
            .entry((r.time.year(), r.time.month()))
            .and_modify(|b| {
                b.energy_kwh += r.energy;
                b.records += 1;
                b.first = b.first.min(r.time);
                b.last = b.last.max(r.time);
            })
            .or_insert(Bucket {
                energy_kwh: r.energy,
                records: 1,
                first: r.time,
                last: r.time,
            });
    }

    let result: Vec<MonthlyEnergy> = months
        .into_iter()
        .filter(|(_, b)| b.energy_kwh > 0.0)
        .map(|((year, month), b)| {
            let energy_mwh = b.energy_kwh / 1000.0;
            let days = (b.last - b.first).num_days() + 1;
            MonthlyEnergy {
                month: format!("{year:04}-{month:02}"),
                energy: round_to(energy_mwh, 2),
                days,
                avg_daily: round_to(energy_mwh / days as f64, 2),
                records: b.records,
            }
        })
        .collect();

    if result.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "no monthly energy data could be computed".to_string(),
        ));
    }
    info!(
        months = result.len(),
        total_mwh = result.iter().map(|m| m.energy).sum::<f64>(),
        "monthly energy computed"
    );
    Ok(result)
}

/// Start and end of the analysed period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub start: String,
    pub end: String,
}

/// Ratio of delivered to nameplate energy over the metered period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityFactor {
    /// Percent.
    pub capacity_factor: f64,
    pub capacity_factor_decimal: f64,
    pub actual_energy_kwh: f64,
    pub actual_energy_mwh: f64,
    pub theoretical_energy_kwh: f64,
    pub theoretical_energy_mwh: f64,
    pub duration_hours: f64,
    pub duration_days: f64,
    pub rated_capacity_kw: f64,
    pub rated_capacity_mw: f64,
    pub period: Period,
}

/// Computes the capacity factor of the metered period.
///
/// The period runs from the first to the last reading, so the theoretical
/// energy is `rated_capacity_kw * (last - first)` in hours.
///
/// # Arguments
///
/// * `meter` - Normalized meter dataset
/// * `rated_capacity_kw` - Plant nameplate capacity (kW)
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if the capacity is not positive,
/// the dataset is empty, or the period has zero length.
pub fn capacity_factor(
    meter: &MeterDataset,
    rated_capacity_kw: f64,
) -> Result<CapacityFactor, AnalysisError> {
    if !rated_capacity_kw.is_finite() || rated_capacity_kw <= 0.0 {
        return Err(AnalysisError::InvalidInput(
            "rated_capacity_kw must be positive".to_string(),
        ));
    }
    if rated_capacity_kw > CAPACITY_SANITY_KW {
        warn!(rated_capacity_kw, "rated capacity seems unusually high");
    }
    let extent = meter.extent().ok_or_else(|| {
        AnalysisError::InvalidInput("no valid meter data for capacity factor".to_string())
    })?;

    let duration_hours = (extent.end - extent.start).num_seconds() as f64 / 3600.0;
    if duration_hours <= 0.0 {
        return Err(AnalysisError::InvalidInput(
            "time duration must be positive".to_string(),
        ));
    }

    let actual_kwh = meter.total_energy_kwh();
    let theoretical_kwh = rated_capacity_kw * duration_hours;
    let decimal = actual_kwh / theoretical_kwh;
    let percent = decimal * 100.0;

    if percent > 100.0 {
        warn!(
            capacity_factor = percent,
            "capacity factor exceeds 100%; check rated capacity"
        );
    } else if percent > 70.0 {
        warn!(capacity_factor = percent, "capacity factor unusually high");
    } else if percent < 5.0 {
        warn!(
            capacity_factor = percent,
            "capacity factor unusually low; possible downtime or data gaps"
        );
    }

    let cf = CapacityFactor {
        capacity_factor: round_to(percent, 2),
        capacity_factor_decimal: round_to(decimal, 4),
        actual_energy_kwh: round_to(actual_kwh, 2),
        actual_energy_mwh: round_to(actual_kwh / 1000.0, 2),
        theoretical_energy_kwh: round_to(theoretical_kwh, 2),
        theoretical_energy_mwh: round_to(theoretical_kwh / 1000.0, 2),
        duration_hours: round_to(duration_hours, 2),
        duration_days: round_to(duration_hours / 24.0, 2),
        rated_capacity_kw,
        rated_capacity_mw: round_to(rated_capacity_kw / 1000.0, 2),
        period: Period {
            start: extent.start.format(ISO_FORMAT).to_string(),
            end: extent.end.format(ISO_FORMAT).to_string(),
        },
    };
    info!(
        capacity_factor = cf.capacity_factor,
        actual_mwh = cf.actual_energy_mwh,
        theoretical_mwh = cf.theoretical_energy_mwh,
        "capacity factor calculated"
    );
    Ok(cf)
}
