//! Completeness scoring of raw uploads.
//!
//! Unlike the other analytics this inspects the raw [`Table`], since missing
//! cells are exactly what normalization would hide.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{mean, round_to};
use crate::error::AnalysisError;
use crate::io::table::Table;
use crate::series::normalize::parse_timestamp;

/// Cell values read as missing.
const NA_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const MISSING_WEIGHT: f64 = 50.0;
const EXPECTED_WEIGHT: f64 = 30.0;
const DUPLICATE_WEIGHT: f64 = 20.0;
const SCADA_SHARE: f64 = 0.6;
const METER_SHARE: f64 = 0.4;

/// Quality metrics for one upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetQuality {
    /// Rows with a valid timestamp.
    pub total_rows: usize,
    pub total_columns: usize,
    /// Percentage of missing cells for columns that have any.
    pub missing_values: BTreeMap<String, f64>,
    pub duplicate_timestamps: usize,
    pub time_coverage_days: f64,
    pub start_date: String,
    pub end_date: String,
    /// Modal sampling interval, e.g. `10min`, `1h`, `1.0d`.
    pub inferred_frequency: String,
    /// 0-100.
    pub completeness_score: f64,
}

/// Quality of both uploads and their weighted overall score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualitySummary {
    pub scada: DatasetQuality,
    pub meter: DatasetQuality,
    pub overall_quality_score: f64,
}

/// Scores the SCADA and meter uploads.
///
/// The overall score weights SCADA at 60 % and meter at 40 %.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if either table is empty, lacks a
/// `timestamp` column, or has no parseable timestamps.
pub fn data_quality_summary(
    scada: &Table,
    meter: &Table,
) -> Result<DataQualitySummary, AnalysisError> {
    if scada.is_empty() || meter.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "uploaded tables cannot be empty".to_string(),
        ));
    }
    let scada = analyze_dataset(scada, "SCADA")?;
    let meter = analyze_dataset(meter, "meter")?;
    let overall = round_to(
        scada.completeness_score * SCADA_SHARE + meter.completeness_score * METER_SHARE,
        2,
    );
    info!(
        scada = scada.completeness_score,
        meter = meter.completeness_score,
        overall,
        "data quality summary generated"
    );
    Ok(DataQualitySummary {
        scada,
        meter,
        overall_quality_score: overall,
    })
}

fn is_missing(cell: &str) -> bool {
    NA_VALUES.contains(&cell.trim())
}

fn analyze_dataset(table: &Table, name: &str) -> Result<DatasetQuality, AnalysisError> {
    let ts_idx = table.column_index("timestamp").ok_or_else(|| {
        AnalysisError::InvalidInput(format!("{name} data must have a 'timestamp' column"))
    })?;

    let mut rows: Vec<(NaiveDateTime, &Vec<String>)> = table
        .rows()
        .iter()
        .filter_map(|row| parse_timestamp(&row[ts_idx]).map(|t| (t, row)))
        .collect();
    let invalid = table.len() - rows.len();
    if invalid > 0 {
        warn!(dataset = name, invalid, "removed rows with invalid timestamps");
    }
    rows.sort_by_key(|(t, _)| *t);

    let (Some(&(start, _)), Some(&(end, _))) = (rows.first(), rows.last()) else {
        return Err(AnalysisError::InvalidInput(format!(
            "{name} data has no valid timestamps"
        )));
    };
    let total_rows = rows.len();

    let mut missing_values = BTreeMap::new();
    for (idx, column) in table.columns().iter().enumerate() {
        let missing = rows.iter().filter(|(_, row)| is_missing(&row[idx])).count();
        let pct = round_to(100.0 * missing as f64 / total_rows as f64, 2);
        if pct > 0.0 {
            missing_values.insert(column.clone(), pct);
        }
    }

    let diffs: Vec<i64> = rows
        .windows(2)
        .map(|w| (w[1].0 - w[0].0).num_seconds())
        .collect();
    let duplicate_timestamps = diffs.iter().filter(|&&d| d == 0).count();
    let coverage_secs = (end - start).num_seconds() as f64;
    let interval = modal_interval(&diffs);

    let inferred_frequency = match (total_rows, interval) {
        (1, _) => "single_record".to_string(),
        (_, Some(secs)) => format_frequency(secs),
        (_, None) => "unknown".to_string(),
    };

    let avg_missing = if missing_values.is_empty() {
        0.0
    } else {
        mean(&missing_values.values().copied().collect::<Vec<_>>())
    };
    let missing_score = (MISSING_WEIGHT - avg_missing).max(0.0);
    let expected_score = expected_records_score(interval, coverage_secs, total_rows);
    let duplicate_ratio = duplicate_timestamps as f64 / total_rows as f64;
    let duplicate_score = (DUPLICATE_WEIGHT - duplicate_ratio * 100.0).max(0.0);
    let completeness_score = round_to(missing_score + expected_score + duplicate_score, 2);

    debug!(
        dataset = name,
        missing_score,
        expected_score,
        duplicate_score,
        "quality components"
    );

    Ok(DatasetQuality {
        total_rows,
        total_columns: table.columns().len(),
        missing_values,
        duplicate_timestamps,
        time_coverage_days: round_to(coverage_secs / 86_400.0, 2),
        start_date: start.format(ISO_FORMAT).to_string(),
        end_date: end.format(ISO_FORMAT).to_string(),
        inferred_frequency,
        completeness_score,
    })
}

/// Most common consecutive difference in seconds; ties go to the shortest.
fn modal_interval(diffs: &[i64]) -> Option<i64> {
    let mut tally: BTreeMap<i64, usize> = BTreeMap::new();
    for &d in diffs {
        *tally.entry(d).or_insert(0) += 1;
    }
    let mut best: Option<(i64, usize)> = None;
    for (secs, count) in tally {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((secs, count));
        }
    }
    best.map(|(secs, _)| secs)
}

/// Renders an interval as `Nmin`, `1h`, `X.Yh` or `X.Yd`.
fn format_frequency(secs: i64) -> String {
    if secs < 3600 {
        format!("{}min", secs / 60)
    } else if secs < 86_400 {
        let hours = secs as f64 / 3600.0;
        if hours == 1.0 {
            "1h".to_string()
        } else {
            format!("{hours:?}h")
        }
    } else {
        format!("{:?}d", secs as f64 / 86_400.0)
    }
}

/// Share of expected records present, scaled to 30.
///
/// Minute intervals are truncated to whole minutes first. Intervals that
/// cannot produce an expectation (under a minute, daily or longer, a single
/// record, zero coverage) score full marks.
fn expected_records_score(interval: Option<i64>, coverage_secs: f64, total_rows: usize) -> f64 {
    let interval_secs = match interval {
        Some(secs) if secs < 3600 => (secs / 60) * 60,
        Some(secs) if secs < 86_400 => secs,
        _ => 0,
    };
    if interval_secs <= 0 {
        return EXPECTED_WEIGHT;
    }
    let expected = coverage_secs / interval_secs as f64;
    if expected <= 0.0 {
        return EXPECTED_WEIGHT;
    }
    (total_rows as f64 / expected).min(1.0) * EXPECTED_WEIGHT
}
