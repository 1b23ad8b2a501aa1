//! Synthetic reanalysis covariate and the zero-loss curtailment placeholder.
//!
//! No external reanalysis product is consulted. The covariate mirrors the
//! resampled SCADA wind speed and carries constant direction and density
//! values from [`CovariateConfig`].

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use super::resample::floor_hour;
use super::types::{
    CovariateDataset, CovariateRecord, CurtailmentDataset, CurtailmentRecord, HourlySeries,
    MeterDataset,
};
use crate::config::CovariateConfig;
use crate::error::AnalysisError;

/// Builds the covariate dataset from the resampled hourly wind speed.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptySeries`] if `hourly` is empty.
pub fn synthesize_covariate(
    hourly: &HourlySeries,
    config: &CovariateConfig,
) -> Result<CovariateDataset, AnalysisError> {
    reindex_hourly(hourly.iter(), config)
}

/// Places wind-speed samples on a strict hourly axis.
///
/// Samples are keyed by their floored hour (a later sample for the same hour
/// replaces an earlier one). Every hour between the first and last key gets a
/// record; hours with no sample carry `wind_speed: None`.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptySeries`] if `samples` is empty.
pub fn reindex_hourly<I>(
    samples: I,
    config: &CovariateConfig,
) -> Result<CovariateDataset, AnalysisError>
where
    I: IntoIterator<Item = (NaiveDateTime, f64)>,
{
    let by_hour: BTreeMap<NaiveDateTime, f64> = samples
        .into_iter()
        .map(|(time, value)| (floor_hour(time), value))
        .collect();

    let (Some((&start, _)), Some((&end, _))) =
        (by_hour.first_key_value(), by_hour.last_key_value())
    else {
        return Err(AnalysisError::EmptySeries(
            "covariate source series has no rows".to_string(),
        ));
    };

    let hours = (end - start).num_hours() + 1;
    let records: Vec<CovariateRecord> = (0..hours)
        .map(|offset| {
            let time = start + Duration::hours(offset);
            CovariateRecord {
                time,
                wind_speed: by_hour.get(&time).copied(),
                wind_direction: config.wind_direction_deg,
                air_density: config.air_density,
            }
        })
        .collect();

    let dataset = CovariateDataset { start, records };
    let missing = dataset.missing_hours();
    if missing > 0 {
        warn!(missing, "covariate has hours without wind speed");
    }
    debug!(
        hours = dataset.len(),
        direction = config.wind_direction_deg,
        density = config.air_density,
        "built synthetic covariate"
    );
    Ok(dataset)
}

/// Zero availability and curtailment losses on the meter timeline.
pub fn curtailment_placeholder(meter: &MeterDataset) -> CurtailmentDataset {
    CurtailmentDataset {
        records: meter
            .records
            .iter()
            .map(|m| CurtailmentRecord {
                time: m.time,
                availability_loss: 0.0,
                curtailment_loss: 0.0,
            })
            .collect(),
    }
}
