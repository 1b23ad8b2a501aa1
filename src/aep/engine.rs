//! Monte Carlo AEP engine.
//!
//! The pipeline only depends on the [`AepEngine`] trait; [`MonteCarloAep`] is
//! the bundled implementation. It regresses daily metered energy on the daily
//! covariate wind speed, then in each trial bootstraps that regression and
//! perturbs the meter, loss and long-term wind inputs before projecting a
//! year of production.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::{debug, info};

use super::window::AnalysisWindow;
use crate::config::SimulationConfig;
use crate::error::AnalysisError;
use crate::series::types::{CovariateDataset, CurtailmentDataset, MeterDataset, ScadaDataset};

const DAYS_PER_YEAR: f64 = 365.0;
const KWH_PER_MWH: f64 = 1000.0;
const SECONDS_PER_DAY: i64 = 86_400;

/// Everything an engine run consumes, borrowed from the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct EngineInputs<'a> {
    pub scada: &'a ScadaDataset,
    pub meter: &'a MeterDataset,
    pub curtailment: &'a CurtailmentDataset,
    pub covariate: &'a CovariateDataset,
    pub window: &'a AnalysisWindow,
    /// Number of trials to run.
    pub num_sim: usize,
}

/// Failure reported by an engine.
#[derive(Debug, Error)]
pub enum EngineFailure {
    /// The prepared data does not satisfy what the engine needs.
    #[error("{0}")]
    Contract(String),
    /// Anything else that went wrong inside the engine.
    #[error("{0}")]
    Internal(String),
}

impl From<EngineFailure> for AnalysisError {
    fn from(failure: EngineFailure) -> Self {
        match failure {
            EngineFailure::Contract(msg) => AnalysisError::EngineIntegration(msg),
            EngineFailure::Internal(msg) => AnalysisError::UnexpectedEngine(msg),
        }
    }
}

/// A stochastic AEP estimator.
///
/// Implementations run `inputs.num_sim` independent trials and return one
/// non-negative annual energy outcome (MWh) per trial.
pub trait AepEngine {
    /// Runs all trials.
    ///
    /// # Errors
    ///
    /// Returns [`EngineFailure::Contract`] when the inputs cannot support an
    /// estimate and [`EngineFailure::Internal`] for any other fault.
    fn simulate(&mut self, inputs: &EngineInputs<'_>) -> Result<Vec<f64>, EngineFailure>;

    /// Short identifier for logs.
    fn name(&self) -> &'static str;
}

/// Generates Gaussian noise with the Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// A draw from `N(0, std_dev²)`, or `0.0` when `std_dev <= 0`.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// One day of the regression data set.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DailyPoint {
    /// Mean covariate wind speed (m/s).
    wind: f64,
    /// Metered energy plus losses (kWh).
    gross_kwh: f64,
    /// Availability and curtailment losses (kWh).
    loss_kwh: f64,
}

/// Ordinary least squares line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LinearFit {
    intercept: f64,
    slope: f64,
}

impl LinearFit {
    /// Fits `points` of `(x, y)`. A degenerate `x` spread gives a flat line
    /// through the mean of `y`.
    fn ols(points: &[(f64, f64)]) -> Self {
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
        let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
            let dx = x - mean_x;
            (sxy + dx * (y - mean_y), sxx + dx * dx)
        });
        let slope = if sxx > 1e-12 { sxy / sxx } else { 0.0 };
        Self {
            intercept: mean_y - slope * mean_x,
            slope,
        }
    }

    fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Bootstrapped regression engine.
#[derive(Debug)]
pub struct MonteCarloAep {
    rng: StdRng,
    meter_uncertainty: f64,
    loss_uncertainty: f64,
    wind_variability: f64,
    long_term_days: i64,
}

impl MonteCarloAep {
    /// Builds an engine from the simulation settings.
    ///
    /// A configured seed makes runs reproducible; without one the RNG is
    /// seeded from OS entropy.
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            meter_uncertainty: config.meter_uncertainty,
            loss_uncertainty: config.loss_uncertainty,
            wind_variability: config.wind_variability,
            long_term_days: i64::from(config.uncertainty_window_years) * 365,
        }
    }
}

/// Daily mean covariate wind speed over hours that have a value.
fn daily_wind(covariate: &CovariateDataset) -> BTreeMap<NaiveDate, f64> {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for record in &covariate.records {
        if let Some(ws) = record.wind_speed {
            let day = sums.entry(record.time.date()).or_insert((0.0, 0));
            day.0 += ws;
            day.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect()
}

/// Most common positive spacing between consecutive meter readings.
///
/// Ties go to the shorter interval. `None` with fewer than two readings.
fn modal_interval(meter: &MeterDataset) -> Option<Duration> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in meter.records.windows(2) {
        let gap = (pair[1].time - pair[0].time).num_seconds();
        if gap > 0 {
            *counts.entry(gap).or_insert(0) += 1;
        }
    }
    let mut best: Option<(i64, usize)> = None;
    for (gap, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((gap, count));
        }
    }
    best.map(|(gap, _)| Duration::seconds(gap))
}

/// Metered energy per calendar day, with the seconds of each day it covers.
///
/// A reading stamped `t` holds the energy produced over `[t, t + span)`,
/// where `span` is the time to the next reading capped at the modal
/// interval (the last reading uses the modal interval). The energy is
/// spread evenly over that span and clipped to `[from, to)`.
fn meter_energy_by_day(
    meter: &MeterDataset,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> BTreeMap<NaiveDate, (f64, i64)> {
    let mut by_day: BTreeMap<NaiveDate, (f64, i64)> = BTreeMap::new();
    let Some(modal) = modal_interval(meter) else {
        return by_day;
    };

    for (i, record) in meter.records.iter().enumerate() {
        let span = meter
            .records
            .get(i + 1)
            .map_or(modal, |next| (next.time - record.time).min(modal));
        let span_secs = span.num_seconds();
        if span_secs <= 0 {
            continue;
        }

        let mut t = record.time.max(from);
        let stop = (record.time + span).min(to);
        while t < stop {
            let date = t.date();
            let midnight = date.and_time(NaiveTime::MIN) + Duration::days(1);
            let seg_end = stop.min(midnight);
            let secs = (seg_end - t).num_seconds();
            let day = by_day.entry(date).or_insert((0.0, 0));
            day.0 += record.energy * secs as f64 / span_secs as f64;
            day.1 += secs;
            t = seg_end;
        }
    }
    by_day
}

/// Daily regression points inside the window with adequate meter coverage.
///
/// Days whose meter readings cover at least half the day are kept and their
/// energy is scaled up to a full day.
fn daily_points(
    inputs: &EngineInputs<'_>,
    wind_by_day: &BTreeMap<NaiveDate, f64>,
) -> Vec<DailyPoint> {
    let first = inputs.window.start.date();
    let last = inputs.window.end.date();
    let stop = last.and_time(NaiveTime::MIN) + Duration::days(1);
    let energy = meter_energy_by_day(inputs.meter, inputs.window.start, stop);

    let mut losses: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in &inputs.curtailment.records {
        let date = record.time.date();
        if date >= first && date <= last {
            *losses.entry(date).or_insert(0.0) +=
                record.availability_loss + record.curtailment_loss;
        }
    }

    energy
        .into_iter()
        .filter(|(_, (_, secs))| *secs * 2 >= SECONDS_PER_DAY)
        .filter_map(|(date, (net_kwh, secs))| {
            let wind = *wind_by_day.get(&date)?;
            let loss_kwh = losses.get(&date).copied().unwrap_or(0.0);
            let coverage = secs as f64 / SECONDS_PER_DAY as f64;
            Some(DailyPoint {
                wind,
                gross_kwh: net_kwh / coverage + loss_kwh,
                loss_kwh,
            })
        })
        .collect()
}

/// Mean daily wind over the `days` days ending on `end`.
fn long_term_wind(
    wind_by_day: &BTreeMap<NaiveDate, f64>,
    end: NaiveDate,
    days: i64,
) -> Option<f64> {
    let start = end - Duration::days(days - 1);
    let (sum, count) = wind_by_day
        .range(start..=end)
        .fold((0.0, 0usize), |(sum, count), (_, ws)| (sum + ws, count + 1));
    (count > 0).then(|| sum / count as f64)
}

impl AepEngine for MonteCarloAep {
    fn simulate(&mut self, inputs: &EngineInputs<'_>) -> Result<Vec<f64>, EngineFailure> {
        if inputs.num_sim == 0 {
            return Err(EngineFailure::Contract(
                "simulation count must be positive".to_string(),
            ));
        }

        let wind_by_day = daily_wind(inputs.covariate);
        let points = daily_points(inputs, &wind_by_day);
        if points.len() < 2 {
            return Err(EngineFailure::Contract(format!(
                "need at least 2 days with both meter energy and covariate wind \
                 inside the window, found {}",
                points.len()
            )));
        }

        let lt_wind = long_term_wind(&wind_by_day, inputs.window.end.date(), self.long_term_days)
            .ok_or_else(|| {
                EngineFailure::Contract(format!(
                    "covariate has no wind data in the {} days ending {}",
                    self.long_term_days,
                    inputs.window.end.date()
                ))
            })?;

        let total_gross: f64 = points.iter().map(|p| p.gross_kwh).sum();
        let total_loss: f64 = points.iter().map(|p| p.loss_kwh).sum();
        let loss_fraction = if total_gross > 0.0 {
            total_loss / total_gross
        } else {
            0.0
        };
        debug!(
            regression_days = points.len(),
            lt_wind,
            loss_fraction,
            "engine inputs prepared"
        );

        let n = points.len();
        let mut resample = Vec::with_capacity(n);
        let mut outcomes = Vec::with_capacity(inputs.num_sim);
        for trial in 0..inputs.num_sim {
            resample.clear();
            for _ in 0..n {
                let p = points[self.rng.random_range(0..n)];
                resample.push((p.wind, p.gross_kwh));
            }
            let fit = LinearFit::ols(&resample);

            let wind = lt_wind * (1.0 + gaussian_noise(&mut self.rng, self.wind_variability));
            let meter_factor = 1.0 + gaussian_noise(&mut self.rng, self.meter_uncertainty);
            let losses = (loss_fraction
                * (1.0 + gaussian_noise(&mut self.rng, self.loss_uncertainty)))
            .clamp(0.0, 1.0);

            let daily_kwh = fit.predict(wind) * meter_factor * (1.0 - losses);
            let aep_mwh = daily_kwh * DAYS_PER_YEAR / KWH_PER_MWH;
            if !aep_mwh.is_finite() {
                return Err(EngineFailure::Internal(format!(
                    "trial {trial} produced a non-finite outcome"
                )));
            }
            outcomes.push(aep_mwh.max(0.0));
        }

        info!(
            engine = self.name(),
            trials = outcomes.len(),
            regression_days = n,
            "monte carlo complete"
        );
        Ok(outcomes)
    }

    fn name(&self) -> &'static str {
        "monte-carlo-regression"
    }
}
