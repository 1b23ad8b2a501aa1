//! Request-scoped datasets flowing through the AEP pipeline.
//!
//! Every dataset is an owned value built fresh for one request and dropped
//! once the response is produced. Time stamps are naive instants in the
//! upload's own clock (offsets are converted to UTC during parsing).

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// Canonical reanalysis wind-speed identifier (IEC 61400-25 naming).
pub const REANALYSIS_WIND_SPEED: &str = "WMETR_HorWdSpd";
/// Canonical reanalysis wind-direction identifier.
pub const REANALYSIS_WIND_DIRECTION: &str = "WMETR_HorWdDir";
/// Canonical reanalysis air-density identifier.
pub const REANALYSIS_AIR_DENSITY: &str = "WMETR_AirDen";

/// Inclusive `[start, end]` time extent of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// One SCADA sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ScadaRecord {
    pub time: NaiveDateTime,
    pub asset_id: String,
    /// Horizontal wind speed (m/s), finite and non-negative.
    pub wind_speed: f64,
    /// Active power (kW), finite and non-negative.
    pub power: f64,
}

/// Turbine telemetry sorted by time with unique `(asset_id, time)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScadaDataset {
    pub records: Vec<ScadaRecord>,
}

impl ScadaDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last time stamps, or `None` when empty.
    pub fn extent(&self) -> Option<Extent> {
        Some(Extent {
            start: self.records.first()?.time,
            end: self.records.last()?.time,
        })
    }

    /// Wind-speed column in time order.
    pub fn wind_speeds(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.wind_speed).collect()
    }
}

/// One revenue-meter sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterRecord {
    pub time: NaiveDateTime,
    /// Energy delivered in the sample interval (kWh), finite and non-negative.
    pub energy: f64,
}

/// Meter readings sorted by time with unique time stamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterDataset {
    pub records: Vec<MeterRecord>,
}

impl MeterDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last time stamps, or `None` when empty.
    pub fn extent(&self) -> Option<Extent> {
        Some(Extent {
            start: self.records.first()?.time,
            end: self.records.last()?.time,
        })
    }

    /// Sum of all energy readings (kWh).
    pub fn total_energy_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.energy).sum()
    }
}

/// Availability and curtailment losses aligned to one meter time stamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurtailmentRecord {
    pub time: NaiveDateTime,
    /// Energy lost to turbine unavailability (kWh).
    pub availability_loss: f64,
    /// Energy lost to curtailment (kWh).
    pub curtailment_loss: f64,
}

/// Loss series sharing the meter timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurtailmentDataset {
    pub records: Vec<CurtailmentRecord>,
}

/// Gap-free hourly wind-speed series produced by the resampler.
///
/// `values[i]` belongs to `start + i hours`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySeries {
    pub start: NaiveDateTime,
    pub values: Vec<f64>,
    /// Number of hours whose value is the gap-fill mean rather than an aggregate.
    pub filled_hours: usize,
}

impl HourlySeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Time stamp of the hour at `offset`.
    pub fn time_at(&self, offset: usize) -> NaiveDateTime {
        self.start + Duration::hours(offset as i64)
    }

    /// Last hour of the series, or `None` when empty.
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.len().checked_sub(1).map(|last| self.time_at(last))
    }

    /// `(time, value)` pairs in time order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (self.time_at(i), *v))
    }
}

/// One synthetic reanalysis hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CovariateRecord {
    pub time: NaiveDateTime,
    /// Wind speed (m/s); `None` marks an hour absent from the source series.
    pub wind_speed: Option<f64>,
    /// Wind direction (degrees).
    pub wind_direction: f64,
    /// Air density (kg/m³).
    pub air_density: f64,
}

/// Strictly hourly long-term reference series.
///
/// `records[i].time == start + i hours` for every `i`, so consumers can
/// index by hour offset.
#[derive(Debug, Clone, PartialEq)]
pub struct CovariateDataset {
    pub start: NaiveDateTime,
    pub records: Vec<CovariateRecord>,
}

impl CovariateDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last hour, or `None` when empty.
    pub fn extent(&self) -> Option<Extent> {
        Some(Extent {
            start: self.records.first()?.time,
            end: self.records.last()?.time,
        })
    }

    /// Record for the hour containing `time`, if inside the series.
    pub fn at(&self, time: NaiveDateTime) -> Option<&CovariateRecord> {
        if time < self.start {
            return None;
        }
        let offset = (time - self.start).num_hours();
        usize::try_from(offset)
            .ok()
            .and_then(|i| self.records.get(i))
    }

    /// Number of hours without a wind-speed value.
    pub fn missing_hours(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.wind_speed.is_none())
            .count()
    }
}
