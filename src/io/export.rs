//! CSV export for AEP samples and the synthetic covariate.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::aep::SimulationResult;
use crate::series::types::{
    CovariateDataset, REANALYSIS_AIR_DENSITY, REANALYSIS_WIND_DIRECTION, REANALYSIS_WIND_SPEED,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exports trial outcomes to a CSV file at the given path.
///
/// # Arguments
///
/// * `result` - Summarized AEP run
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_samples_csv(result: &SimulationResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_samples_csv(result, io::BufWriter::new(file))
}

/// Writes one `trial,aep_mwh` row per trial, in trial order.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_samples_csv(result: &SimulationResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["trial", "aep_mwh"])?;
    for (trial, aep) in result.samples.iter().enumerate() {
        wtr.write_record(&[trial.to_string(), format!("{aep:.2}")])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Exports the covariate to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_covariate_csv(covariate: &CovariateDataset, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_covariate_csv(covariate, io::BufWriter::new(file))
}

/// Writes the covariate with canonical reanalysis column names.
///
/// Hours without a wind speed get an empty cell.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_covariate_csv(covariate: &CovariateDataset, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record([
        "timestamp",
        REANALYSIS_WIND_SPEED,
        REANALYSIS_WIND_DIRECTION,
        REANALYSIS_AIR_DENSITY,
    ])?;
    for r in &covariate.records {
        wtr.write_record(&[
            r.time.format(TIMESTAMP_FORMAT).to_string(),
            r.wind_speed.map(|ws| format!("{ws:.4}")).unwrap_or_default(),
            format!("{:.1}", r.wind_direction),
            format!("{:.4}", r.air_density),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::types::CovariateRecord;
    use chrono::{Duration, NaiveDate};

    fn covariate() -> CovariateDataset {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid time");
        let records = (0..3)
            .map(|h| CovariateRecord {
                time: start + Duration::hours(h),
                wind_speed: (h != 1).then_some(7.5),
                wind_direction: 180.0,
                air_density: 1.225,
            })
            .collect();
        CovariateDataset { start, records }
    }

    #[test]
    fn samples_header_and_rows() {
        let result = SimulationResult::from_samples(&[10.0, 12.5]).expect("non-empty");
        let mut buf = Vec::new();
        write_samples_csv(&result, &mut buf).ok();
        let output = String::from_utf8(buf).ok().unwrap_or_default();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, vec!["trial,aep_mwh", "0,10.00", "1,12.50"]);
    }

    #[test]
    fn covariate_uses_canonical_names() {
        let mut buf = Vec::new();
        write_covariate_csv(&covariate(), &mut buf).ok();
        let output = String::from_utf8(buf).ok().unwrap_or_default();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,WMETR_HorWdSpd,WMETR_HorWdDir,WMETR_AirDen")
        );
        assert_eq!(lines.next(), Some("2022-01-01 00:00:00,7.5000,180.0,1.2250"));
        assert_eq!(lines.next(), Some("2022-01-01 01:00:00,,180.0,1.2250"));
    }

    #[test]
    fn export_to_file() {
        let dir = std::env::temp_dir().join("wind_analyst_export_test");
        std::fs::create_dir_all(&dir).ok();
        let path = dir.join("covariate.csv");
        let res = export_covariate_csv(&covariate(), &path);
        assert!(res.is_ok());
        let content = std::fs::read_to_string(&path).ok().unwrap_or_default();
        assert_eq!(content.lines().count(), 4);
        std::fs::remove_dir_all(&dir).ok();
    }
}
