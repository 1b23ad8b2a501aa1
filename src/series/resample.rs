//! Hourly resampling of the SCADA wind-speed series.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use tracing::{debug, info};

use super::types::{HourlySeries, ScadaDataset};
use crate::error::AnalysisError;

/// Truncates a time stamp to the start of its hour.
pub fn floor_hour(time: NaiveDateTime) -> NaiveDateTime {
    time.date().and_time(NaiveTime::MIN) + Duration::hours(i64::from(time.hour()))
}

/// Resamples the SCADA wind speed of every asset onto one hourly series.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptySeries`] if the dataset has no records.
pub fn resample_wind_speed(scada: &ScadaDataset) -> Result<HourlySeries, AnalysisError> {
    resample_hourly(scada.records.iter().map(|r| (r.time, r.wind_speed)))
}

/// Aggregates irregular samples into a gap-free hourly series.
///
/// Each sample lands in the bucket of its floored hour and buckets take the
/// mean of their samples. Hours inside the span that received no samples are
/// filled with the mean of all aggregated hourly values.
///
/// # Arguments
///
/// * `samples` - `(time, value)` pairs in any order
///
/// # Returns
///
/// An [`HourlySeries`] covering the first through last populated hour.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptySeries`] if `samples` is empty.
pub fn resample_hourly<I>(samples: I) -> Result<HourlySeries, AnalysisError>
where
    I: IntoIterator<Item = (NaiveDateTime, f64)>,
{
    let mut buckets: BTreeMap<NaiveDateTime, (f64, usize)> = BTreeMap::new();
    for (time, value) in samples {
        let bucket = buckets.entry(floor_hour(time)).or_insert((0.0, 0));
        bucket.0 += value;
        bucket.1 += 1;
    }

    let (Some((&start, _)), Some((&end, _))) =
        (buckets.first_key_value(), buckets.last_key_value())
    else {
        return Err(AnalysisError::EmptySeries(
            "SCADA wind speed has no rows to resample".to_string(),
        ));
    };

    let means: BTreeMap<NaiveDateTime, f64> = buckets
        .into_iter()
        .map(|(hour, (sum, count))| (hour, sum / count as f64))
        .collect();
    let fill_value = means.values().sum::<f64>() / means.len() as f64;

    let hours = (end - start).num_hours() + 1;
    let mut values = Vec::with_capacity(usize::try_from(hours).unwrap_or_default());
    let mut filled_hours = 0;
    for offset in 0..hours {
        match means.get(&(start + Duration::hours(offset))) {
            Some(&mean) => values.push(mean),
            None => {
                filled_hours += 1;
                values.push(fill_value);
            }
        }
    }

    if filled_hours > 0 {
        debug!(filled_hours, fill_value, "gap-filled hourly buckets");
    }
    info!(
        start = %start,
        end = %end,
        hours = values.len(),
        filled_hours,
        "resampled wind speed to hourly"
    );

    Ok(HourlySeries {
        start,
        values,
        filled_hours,
    })
}
