//! Series normalizer: schema check, type coercion, cleaning, sort and dedup.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use super::types::{MeterDataset, MeterRecord, ScadaDataset, ScadaRecord};
use crate::error::AnalysisError;
use crate::io::table::Table;

/// Columns every SCADA upload must carry.
pub const SCADA_REQUIRED: &[&str] = &["timestamp", "wind_speed", "power"];
/// Columns every meter upload must carry.
pub const METER_REQUIRED: &[&str] = &["timestamp", "energy"];
/// Optional SCADA column naming the turbine.
pub const ASSET_ID_COLUMN: &str = "asset_id";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Row accounting for one normalized input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub input_rows: usize,
    pub invalid_timestamps: usize,
    /// Rows with an empty, unparseable or non-finite numeric cell.
    pub invalid_values: usize,
    /// Rows with a negative wind speed, power or energy reading.
    pub negative_values: usize,
    pub duplicates: usize,
    pub kept_rows: usize,
}

impl NormalizeReport {
    fn log(&self, dataset: &str) {
        if self.invalid_timestamps > 0 {
            warn!(
                dataset,
                count = self.invalid_timestamps,
                "dropped rows with unparseable timestamps"
            );
        }
        if self.invalid_values > 0 {
            warn!(
                dataset,
                count = self.invalid_values,
                "dropped rows with missing or non-numeric values"
            );
        }
        if self.negative_values > 0 {
            warn!(
                dataset,
                count = self.negative_values,
                "dropped rows with negative readings"
            );
        }
        if self.duplicates > 0 {
            warn!(dataset, count = self.duplicates, "dropped duplicate rows");
        }
        info!(
            dataset,
            input = self.input_rows,
            kept = self.kept_rows,
            "normalized input"
        );
    }
}

/// Both inputs after normalization, with their row accounting.
#[derive(Debug, Clone)]
pub struct NormalizedInputs {
    pub scada: ScadaDataset,
    pub meter: MeterDataset,
    pub scada_report: NormalizeReport,
    pub meter_report: NormalizeReport,
}

/// Checks both inputs for required columns before any parsing.
///
/// # Errors
///
/// Returns [`AnalysisError::Schema`] listing every missing column of both
/// inputs when either is incomplete.
pub fn check_schema(scada: &Table, meter: &Table) -> Result<(), AnalysisError> {
    let scada_missing = scada.missing_columns(SCADA_REQUIRED);
    let meter_missing = meter.missing_columns(METER_REQUIRED);
    if scada_missing.is_empty() && meter_missing.is_empty() {
        return Ok(());
    }
    Err(AnalysisError::Schema {
        scada_missing,
        meter_missing,
    })
}

/// Normalizes a SCADA and meter upload pair.
///
/// The inputs are never modified; fresh datasets are returned.
///
/// # Errors
///
/// Returns [`AnalysisError::Schema`] if either input lacks required columns.
pub fn normalize_inputs(
    scada: &Table,
    meter: &Table,
    default_asset_id: &str,
) -> Result<NormalizedInputs, AnalysisError> {
    check_schema(scada, meter)?;
    let (scada, scada_report) = normalize_scada(scada, default_asset_id)?;
    let (meter, meter_report) = normalize_meter(meter)?;
    Ok(NormalizedInputs {
        scada,
        meter,
        scada_report,
        meter_report,
    })
}

/// Normalizes a SCADA upload into a sorted, deduplicated dataset.
///
/// Rows with bad timestamps, bad numbers or negative readings are dropped and
/// counted. Rows without an asset identifier get `default_asset_id`.
///
/// # Errors
///
/// Returns [`AnalysisError::Schema`] if required SCADA columns are missing.
pub fn normalize_scada(
    table: &Table,
    default_asset_id: &str,
) -> Result<(ScadaDataset, NormalizeReport), AnalysisError> {
    let (Some(ts_idx), Some(ws_idx), Some(pw_idx)) = (
        table.column_index("timestamp"),
        table.column_index("wind_speed"),
        table.column_index("power"),
    ) else {
        return Err(AnalysisError::Schema {
            scada_missing: table.missing_columns(SCADA_REQUIRED),
            meter_missing: Vec::new(),
        });
    };
    let asset_idx = table.column_index(ASSET_ID_COLUMN);
    if asset_idx.is_none() {
        debug!(asset_id = default_asset_id, "no asset_id column, using default");
    }

    let mut report = NormalizeReport {
        input_rows: table.len(),
        ..NormalizeReport::default()
    };
    let mut records = Vec::with_capacity(table.len());

    for row in table.rows() {
        let Some(time) = parse_timestamp(&row[ts_idx]) else {
            report.invalid_timestamps += 1;
            continue;
        };
        let (Some(wind_speed), Some(power)) =
            (parse_value(&row[ws_idx]), parse_value(&row[pw_idx]))
        else {
            report.invalid_values += 1;
            continue;
        };
        if wind_speed < 0.0 || power < 0.0 {
            report.negative_values += 1;
            continue;
        }
        let asset_id = asset_idx
            .map(|i| row[i].trim())
            .filter(|id| !id.is_empty())
            .unwrap_or(default_asset_id)
            .to_string();
        records.push(ScadaRecord {
            time,
            asset_id,
            wind_speed,
            power,
        });
    }

    records.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.asset_id.cmp(&b.asset_id)));
    let before = records.len();
    records.dedup_by(|later, earlier| {
        later.time == earlier.time && later.asset_id == earlier.asset_id
    });
    report.duplicates = before - records.len();
    report.kept_rows = records.len();
    report.log("SCADA");

    Ok((ScadaDataset { records }, report))
}

/// Normalizes a meter upload into a sorted, deduplicated dataset.
///
/// # Errors
///
/// Returns [`AnalysisError::Schema`] if required meter columns are missing.
pub fn normalize_meter(table: &Table) -> Result<(MeterDataset, NormalizeReport), AnalysisError> {
    let (Some(ts_idx), Some(energy_idx)) =
        (table.column_index("timestamp"), table.column_index("energy"))
    else {
        return Err(AnalysisError::Schema {
            scada_missing: Vec::new(),
            meter_missing: table.missing_columns(METER_REQUIRED),
        });
    };

    let mut report = NormalizeReport {
        input_rows: table.len(),
        ..NormalizeReport::default()
    };
    let mut records = Vec::with_capacity(table.len());

    for row in table.rows() {
        let Some(time) = parse_timestamp(&row[ts_idx]) else {
            report.invalid_timestamps += 1;
            continue;
        };
        let Some(energy) = parse_value(&row[energy_idx]) else {
            report.invalid_values += 1;
            continue;
        };
        if energy < 0.0 {
            report.negative_values += 1;
            continue;
        }
        records.push(MeterRecord { time, energy });
    }

    records.sort_by_key(|r| r.time);
    let before = records.len();
    records.dedup_by_key(|r| r.time);
    report.duplicates = before - records.len();
    report.kept_rows = records.len();
    report.log("meter");

    Ok((MeterDataset { records }, report))
}

/// Parses a timestamp cell in any of the accepted layouts.
///
/// RFC 3339 values with an offset are converted to UTC. Returns `None` for
/// anything else, including empty cells.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses a finite numeric cell.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn accepts_common_timestamp_layouts() {
        for raw in [
            "2022-03-04 05:06:07",
            "2022-03-04T05:06:07",
            "2022-03-04T05:06:07.250",
            "2022-03-04T05:06:07Z",
            "2022-03-04 05:06:07.5",
            "2022/03/04 05:06:07",
        ] {
            let ts = parse_timestamp(raw);
            assert!(ts.is_some(), "{raw} should parse");
            assert_eq!(ts.map(|t| t.second()), Some(7));
        }
        assert!(parse_timestamp("2022-03-04").is_some());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn offset_timestamps_convert_to_utc() {
        let ts = parse_timestamp("2022-03-04T05:00:00+02:00");
        assert_eq!(ts.map(|t| t.hour()), Some(3));
    }

    #[test]
    fn missing_columns_reported_for_both_inputs() {
        let scada = Table::new(vec!["timestamp", "wind_speed"], Vec::new());
        let meter = Table::new(vec!["timestamp"], Vec::new());
        let err = normalize_inputs(&scada, &meter, "turbine_01").err();
        match err {
            Some(AnalysisError::Schema {
                scada_missing,
                meter_missing,
            }) => {
                assert_eq!(scada_missing, vec!["power".to_string()]);
                assert_eq!(meter_missing, vec!["energy".to_string()]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn scada_cleaning_drops_and_counts() {
        let table = Table::new(
            vec!["timestamp", "wind_speed", "power"],
            rows(&[
                &["2022-01-01 00:20:00", "7.0", "900"],
                &["garbage", "7.0", "900"],
                &["2022-01-01 00:00:00", "5.0", "300"],
                &["2022-01-01 00:10:00", "-1.0", "0"],
                &["2022-01-01 00:30:00", "", "100"],
                &["2022-01-01 00:00:00", "6.0", "400"],
            ]),
        );
        let (scada, report) = normalize_scada(&table, "turbine_01").expect("schema is complete");
        assert_eq!(report.input_rows, 6);
        assert_eq!(report.invalid_timestamps, 1);
        assert_eq!(report.negative_values, 1);
        assert_eq!(report.invalid_values, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.kept_rows, 2);
        assert_eq!(scada.records[0].wind_speed, 5.0, "first duplicate is kept");
        assert_eq!(scada.records[0].asset_id, "turbine_01");
        assert!(scada.records[0].time < scada.records[1].time);
    }

    #[test]
    fn duplicates_are_per_asset() {
        let table = Table::new(
            vec!["timestamp", "wind_speed", "power", "asset_id"],
            rows(&[
                &["2022-01-01 00:00:00", "5.0", "300", "T2"],
                &["2022-01-01 00:00:00", "6.0", "400", "T1"],
                &["2022-01-01 00:00:00", "6.5", "450", ""],
            ]),
        );
        let (scada, report) = normalize_scada(&table, "T1").expect("schema is complete");
        assert_eq!(report.duplicates, 1);
        let ids: Vec<&str> = scada.records.iter().map(|r| r.asset_id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2"]);
    }

    #[test]
    fn meter_cleaning_keeps_input_untouched() {
        let table = Table::new(
            vec!["timestamp", "energy"],
            rows(&[
                &["2022-01-01 01:00:00", "10"],
                &["2022-01-01 00:00:00", "-3"],
                &["2022-01-01 00:30:00", "nan"],
                &["2022-01-01 00:00:00", "4"],
            ]),
        );
        let snapshot = table.clone();
        let (meter, report) = normalize_meter(&table).expect("schema is complete");
        assert_eq!(table, snapshot);
        assert_eq!(report.negative_values, 1);
        assert_eq!(report.invalid_values, 1);
        assert_eq!(meter.len(), 2);
        assert_eq!(meter.total_energy_kwh(), 14.0);
    }
}
