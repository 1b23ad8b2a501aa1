//! Error taxonomy for the analysis pipeline and its sibling statistics.

use thiserror::Error;

/// Days-per-month factor used when describing a span in months.
const DAYS_PER_MONTH: f64 = 30.44;

/// Every failure the analysis surface can report to a caller.
///
/// Validation variants are raised before any simulation work starts so that
/// doomed input never reaches the Monte Carlo engine.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Required columns are absent from one or both inputs.
    #[error("{}", schema_message(.scada_missing, .meter_missing))]
    Schema {
        /// Missing SCADA column names, in required-column order.
        scada_missing: Vec<String>,
        /// Missing meter column names, in required-column order.
        meter_missing: Vec<String>,
    },

    /// No usable rows remain after cleaning; the message names the dataset.
    #[error("empty series: {0}")]
    EmptySeries(String),

    /// The common data window is shorter than the analysis floor.
    #[error(
        "Insufficient data: only {raw_days} days (~{:.1} months) of overlapping SCADA, meter and \
         reanalysis data ({effective_days} days after a {buffer_days}-day end buffer). \
         Please supply at least {required_days} days of data.",
        months(.raw_days)
    )]
    InsufficientData {
        /// Inclusive day count of the raw common window.
        raw_days: i64,
        /// Inclusive day count after the end buffer is applied.
        effective_days: i64,
        /// Buffer subtracted from the common end.
        buffer_days: i64,
        /// Minimum day count the analysis accepts.
        required_days: i64,
    },

    /// Prepared data does not satisfy the simulation engine's input contract.
    #[error("AEP engine rejected the prepared data: {0}")]
    EngineIntegration(String),

    /// Any other failure inside the simulation engine.
    #[error("unexpected AEP engine failure: {0}")]
    UnexpectedEngine(String),

    /// Invalid argument to a descriptive-statistics routine.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Malformed CSV payload.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Returns `true` when the caller can fix the failure by changing the input.
    ///
    /// Only [`AnalysisError::UnexpectedEngine`] and I/O failures are treated
    /// as internal faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::UnexpectedEngine(_) | Self::Io(_))
    }
}

fn months(days: &i64) -> f64 {
    *days as f64 / DAYS_PER_MONTH
}

fn schema_message(scada_missing: &[String], meter_missing: &[String]) -> String {
    let mut parts = Vec::with_capacity(2);
    if !scada_missing.is_empty() {
        parts.push(format!(
            "Missing required SCADA columns: [{}]",
            scada_missing.join(", ")
        ));
    }
    if !meter_missing.is_empty() {
        parts.push(format!(
            "Missing required meter columns: [{}]",
            meter_missing.join(", ")
        ));
    }
    parts.join("; ")
}
