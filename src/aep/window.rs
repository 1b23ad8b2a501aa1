//! Analysis window derivation and the minimum-duration gate.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::series::types::Extent;

/// Minimum-duration and end-buffer rules for the analysis window.
///
/// `tiers` are `(max_total_days, buffer_days)` pairs checked in order; the
/// first tier whose bound covers the total span supplies the buffer, and
/// longer spans fall back to `fallback_buffer_days`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPolicy {
    pub min_days: i64,
    pub tiers: Vec<(i64, i64)>,
    pub fallback_buffer_days: i64,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            min_days: 365,
            tiers: vec![(370, 0), (385, 1)],
            fallback_buffer_days: 5,
        }
    }
}

/// The common, buffered window handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    /// Latest start among the inputs.
    pub start: NaiveDateTime,
    /// Buffered end: day start of the common end minus the buffer.
    pub end: NaiveDateTime,
    /// Inclusive day count of `[start, end]`.
    pub duration_days: i64,
    /// Earliest end among the inputs, before buffering.
    pub common_end: NaiveDateTime,
    /// Inclusive day count of `[start, common_end]`.
    pub total_days: i64,
    pub buffer_days: i64,
}

/// Inclusive whole-day count between two instants.
///
/// Partial days are truncated before adding the end day, so a span from
/// Jan 1 00:00 to Dec 31 23:50 counts 365 days.
pub fn inclusive_days(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    (end - start).num_days() + 1
}

/// Midnight of the day containing `time`.
pub fn day_start(time: NaiveDateTime) -> NaiveDateTime {
    time.date().and_time(NaiveTime::MIN)
}

impl WindowPolicy {
    /// Buffer applied to a span of `total_days`.
    pub fn buffer_days(&self, total_days: i64) -> i64 {
        self.tiers
            .iter()
            .find(|(max_days, _)| total_days <= *max_days)
            .map_or(self.fallback_buffer_days, |(_, buffer)| *buffer)
    }

    /// Intersects the three input extents and applies the policy.
    ///
    /// # Arguments
    ///
    /// * `scada` - Extent of the normalized SCADA dataset
    /// * `meter` - Extent of the normalized meter dataset
    /// * `covariate` - Extent of the synthetic covariate
    ///
    /// # Returns
    ///
    /// The buffered [`AnalysisWindow`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InsufficientData`] if the raw common span or
    /// the buffered span is shorter than `min_days`. Both counts are reported
    /// either way.
    pub fn evaluate(
        &self,
        scada: Extent,
        meter: Extent,
        covariate: Extent,
    ) -> Result<AnalysisWindow, AnalysisError> {
        let start = scada.start.max(meter.start).max(covariate.start);
        let common_end = scada.end.min(meter.end).min(covariate.end);

        let total_days = inclusive_days(start, common_end);
        let buffer_days = self.buffer_days(total_days);
        let end = day_start(common_end) - Duration::days(buffer_days);
        let duration_days = inclusive_days(start, end);

        if total_days < self.min_days || duration_days < self.min_days {
            warn!(
                total_days,
                effective_days = duration_days,
                buffer_days,
                required = self.min_days,
                "analysis window too short"
            );
            return Err(AnalysisError::InsufficientData {
                raw_days: total_days,
                effective_days: duration_days,
                buffer_days,
                required_days: self.min_days,
            });
        }

        info!(
            start = %start,
            end = %end,
            total_days,
            buffer_days,
            effective_days = duration_days,
            "analysis window accepted"
        );
        Ok(AnalysisWindow {
            start,
            end,
            duration_days,
            common_end,
            total_days,
            buffer_days,
        })
    }
}
