//! Two-parameter Weibull fit of the wind-speed distribution.

use serde::Serialize;
use tracing::{info, warn};

use super::round_to;
use crate::error::AnalysisError;
use crate::series::types::ScadaDataset;

const MIN_RELIABLE_SAMPLES: usize = 100;
const SHAPE_BRACKET: (f64, f64) = (1e-3, 100.0);
const BISECTION_STEPS: usize = 200;

/// Maximum-likelihood Weibull parameters (location fixed at zero).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeibullFit {
    pub shape_k: f64,
    /// Scale (m/s).
    pub scale_c: f64,
    /// Mean implied by the fit, `c * Γ(1 + 1/k)` (m/s).
    pub mean_weibull: f64,
    pub valid_samples: usize,
}

/// Fits a Weibull distribution to the strictly positive wind speeds.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if there are no positive speeds
/// or they are all identical.
pub fn weibull_fit(scada: &ScadaDataset) -> Result<WeibullFit, AnalysisError> {
    let total = scada.len();
    let speeds: Vec<f64> = scada
        .records
        .iter()
        .map(|r| r.wind_speed)
        .filter(|ws| *ws > 0.0)
        .collect();
    if speeds.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "no positive wind speed values available for Weibull fitting".to_string(),
        ));
    }
    let removed = total - speeds.len();
    if removed > 0 {
        warn!(
            removed,
            pct = 100.0 * removed as f64 / total as f64,
            "excluded non-positive wind speeds from Weibull fit"
        );
    }
    if speeds.len() < MIN_RELIABLE_SAMPLES {
        warn!(
            samples = speeds.len(),
            "Weibull fit may be unreliable with fewer than {MIN_RELIABLE_SAMPLES} samples"
        );
    }

    let (k, c) = fit_mle(&speeds).ok_or_else(|| {
        AnalysisError::InvalidInput(
            "wind speeds have no spread; Weibull shape is undefined".to_string(),
        )
    })?;

    if !(0.5..=10.0).contains(&k) {
        warn!(shape_k = k, "Weibull shape outside typical range 0.5-10");
    }
    if c > 50.0 {
        warn!(scale_c = c, "Weibull scale unusually high");
    }

    let fit = WeibullFit {
        shape_k: round_to(k, 3),
        scale_c: round_to(c, 3),
        mean_weibull: round_to(c * gamma(1.0 + 1.0 / k), 2),
        valid_samples: speeds.len(),
    };
    info!(
        shape_k = fit.shape_k,
        scale_c = fit.scale_c,
        samples = fit.valid_samples,
        "Weibull fit complete"
    );
    Ok(fit)
}

/// Solves the shape likelihood equation by bisection and derives the scale.
///
/// The score `Σ xᵏ ln x / Σ xᵏ - 1/k - mean(ln x)` is increasing in `k`.
/// Speeds are scaled by their maximum to keep `xᵏ` bounded. Returns `None`
/// when no root exists in the bracket (identical values).
fn fit_mle(speeds: &[f64]) -> Option<(f64, f64)> {
    let n = speeds.len() as f64;
    let x_max = speeds.iter().copied().fold(0.0, f64::max);
    let ln_x: Vec<f64> = speeds.iter().map(|x| x.ln()).collect();
    let mean_ln = ln_x.iter().sum::<f64>() / n;
    let scaled: Vec<f64> = speeds.iter().map(|x| x / x_max).collect();

    let score = |k: f64| {
        let (num, den) = scaled
            .iter()
            .zip(&ln_x)
            .fold((0.0, 0.0), |(num, den), (s, l)| {
                let w = s.powf(k);
                (num + w * l, den + w)
            });
        num / den - 1.0 / k - mean_ln
    };

    let (mut lo, mut hi) = SHAPE_BRACKET;
    if score(lo) > 0.0 || score(hi) < 0.0 {
        return None;
    }
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if score(mid) < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let k = 0.5 * (lo + hi);
    let mean_pow = scaled.iter().map(|s| s.powf(k)).sum::<f64>() / n;
    Some((k, x_max * mean_pow.powf(1.0 / k)))
}

/// Gamma function via the Lanczos approximation (g = 7).
pub(crate) fn gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEF: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if x < 0.5 {
        return std::f64::consts::PI / ((std::f64::consts::PI * x).sin() * gamma(1.0 - x));
    }
    let x = x - 1.0;
    let t = x + G + 0.5;
    let series = COEF[1..]
        .iter()
        .enumerate()
        .fold(COEF[0], |acc, (i, c)| acc + c / (x + i as f64 + 1.0));
    (2.0 * std::f64::consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * series
}
