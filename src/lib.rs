//! Wind plant energy analysis.
//!
//! Estimates long-term annual energy production (AEP) at P50/P90 from
//! operational SCADA and revenue-meter data, and computes descriptive
//! analytics (data quality, wind statistics, Weibull fit, power curve,
//! monthly energy, capacity factor) over the same uploads.

pub mod aep;
pub mod analytics;
#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod series;

pub use aep::{SimulationResult, run_aep};
pub use config::AnalystConfig;
pub use error::AnalysisError;
pub use io::Table;
