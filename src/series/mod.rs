//! Time-series preparation: normalization, hourly resampling and the
//! synthetic covariate.

pub mod covariate;
pub mod normalize;
pub mod resample;
pub mod types;

pub use covariate::{curtailment_placeholder, synthesize_covariate};
pub use normalize::{NormalizeReport, NormalizedInputs, normalize_inputs};
pub use resample::resample_wind_speed;
pub use types::{
    CovariateDataset, CurtailmentDataset, Extent, HourlySeries, MeterDataset, ScadaDataset,
};
