//! Reduction of the trial distribution to P50/P90.

use std::fmt;

use serde::Serialize;

/// Percentile summary of one AEP run (all values in MWh).
///
/// P90 is the value exceeded with 90 % probability, i.e. the 10th percentile
/// of the outcome distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub p50: f64,
    pub p90: f64,
    /// Trial outcomes in trial order.
    pub samples: Vec<f64>,
}

impl SimulationResult {
    /// Summarizes raw trial outcomes.
    ///
    /// `p50` and `p90` are computed on the unrounded outcomes, then every
    /// reported value is rounded to 2 decimal places. Returns `None` when
    /// `samples` is empty.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let p50 = percentile(samples, 50.0)?;
        let p90 = percentile(samples, 10.0)?;
        Some(Self {
            p50: round2(p50),
            p90: round2(p90),
            samples: samples.iter().copied().map(round2).collect(),
        })
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (lo, hi) = self
            .samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        writeln!(f, "--- AEP Report ---")?;
        writeln!(f, "Trials:        {}", self.samples.len())?;
        writeln!(f, "P50:           {:.2} MWh/yr", self.p50)?;
        writeln!(f, "P90:           {:.2} MWh/yr", self.p90)?;
        write!(f, "Sample range:  {lo:.2} .. {hi:.2} MWh/yr")
    }
}

/// Linear-interpolation percentile (`0 <= p <= 100`).
///
/// The rank is `p / 100 * (n - 1)` over the sorted values and the result
/// interpolates between the two neighbouring order statistics. Returns
/// `None` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Rounds to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
