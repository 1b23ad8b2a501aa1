//! AEP pipeline: normalize, resample, synthesize the covariate, gate on the
//! analysis window, simulate and summarize.

pub mod engine;
pub mod summary;
pub mod window;

use tracing::info;

use crate::config::AnalystConfig;
use crate::error::AnalysisError;
use crate::io::table::Table;
use crate::series::{
    CovariateDataset, HourlySeries, NormalizeReport, curtailment_placeholder, normalize_inputs,
    resample_wind_speed, synthesize_covariate,
};

pub use engine::{AepEngine, EngineFailure, EngineInputs, MonteCarloAep};
pub use summary::SimulationResult;
pub use window::{AnalysisWindow, WindowPolicy};

/// Everything a pipeline run produced besides the headline summary.
#[derive(Debug, Clone)]
pub struct AepAnalysis {
    pub result: SimulationResult,
    pub window: AnalysisWindow,
    /// Resampled hourly wind speed that fed the covariate.
    pub hourly: HourlySeries,
    pub covariate: CovariateDataset,
    pub scada_report: NormalizeReport,
    pub meter_report: NormalizeReport,
}

/// Estimates P50/P90 AEP from raw SCADA and meter tables.
///
/// Uses [`MonteCarloAep`] and the default [`WindowPolicy`].
///
/// # Errors
///
/// See [`run_aep_with`].
pub fn run_aep(
    scada: &Table,
    meter: &Table,
    config: &AnalystConfig,
) -> Result<SimulationResult, AnalysisError> {
    analyze(scada, meter, config).map(|analysis| analysis.result)
}

/// Like [`run_aep`] but returns the intermediate products as well.
///
/// # Errors
///
/// See [`run_aep_with`].
pub fn analyze(
    scada: &Table,
    meter: &Table,
    config: &AnalystConfig,
) -> Result<AepAnalysis, AnalysisError> {
    let mut engine = MonteCarloAep::new(&config.simulation);
    run_aep_with(scada, meter, config, &WindowPolicy::default(), &mut engine)
}

/// Runs the pipeline with an explicit window policy and engine.
///
/// Validation happens before any simulation work: both schemas are checked
/// first, then the window gate runs before the engine is invoked.
///
/// # Arguments
///
/// * `scada` - SCADA table with `timestamp`, `wind_speed`, `power` columns
/// * `meter` - meter table with `timestamp`, `energy` columns
/// * `config` - trial count, plant and covariate settings
/// * `policy` - minimum duration and end-buffer rules
/// * `engine` - trial runner
///
/// # Errors
///
/// - [`AnalysisError::InvalidInput`] if `config.simulation.num_sim` is zero or
///   above `max_num_sim`
/// - [`AnalysisError::Schema`] if required columns are missing
/// - [`AnalysisError::EmptySeries`] if either input has no usable rows
/// - [`AnalysisError::InsufficientData`] if the window is too short
/// - [`AnalysisError::EngineIntegration`] / [`AnalysisError::UnexpectedEngine`]
///   for engine failures
pub fn run_aep_with<E: AepEngine>(
    scada: &Table,
    meter: &Table,
    config: &AnalystConfig,
    policy: &WindowPolicy,
    engine: &mut E,
) -> Result<AepAnalysis, AnalysisError> {
    let num_sim = config.simulation.num_sim;
    if num_sim == 0 {
        return Err(AnalysisError::InvalidInput(
            "num_sim must be a positive integer".to_string(),
        ));
    }
    let max_num_sim = config.simulation.max_num_sim;
    if num_sim > max_num_sim {
        return Err(AnalysisError::InvalidInput(format!(
            "num_sim must be at most {max_num_sim}, got {num_sim}"
        )));
    }

    let inputs = normalize_inputs(scada, meter, &config.plant.asset_id)?;
    let hourly = resample_wind_speed(&inputs.scada)?;
    let covariate = synthesize_covariate(&hourly, &config.covariate)?;
    let curtailment = curtailment_placeholder(&inputs.meter);

    let (Some(scada_extent), Some(meter_extent), Some(covariate_extent)) = (
        inputs.scada.extent(),
        inputs.meter.extent(),
        covariate.extent(),
    ) else {
        return Err(AnalysisError::EmptySeries(
            "meter data has no usable rows".to_string(),
        ));
    };
    let window = policy.evaluate(scada_extent, meter_extent, covariate_extent)?;

    info!(engine = engine.name(), num_sim, "running AEP simulation");
    let samples = engine.simulate(&EngineInputs {
        scada: &inputs.scada,
        meter: &inputs.meter,
        curtailment: &curtailment,
        covariate: &covariate,
        window: &window,
        num_sim,
    })?;
    if samples.len() != num_sim {
        return Err(AnalysisError::UnexpectedEngine(format!(
            "engine returned {} outcomes for {num_sim} trials",
            samples.len()
        )));
    }
    let result = SimulationResult::from_samples(&samples).ok_or_else(|| {
        AnalysisError::UnexpectedEngine("engine returned no outcomes".to_string())
    })?;

    info!(p50 = result.p50, p90 = result.p90, "AEP estimate complete");
    Ok(AepAnalysis {
        result,
        window,
        hourly,
        covariate,
        scada_report: inputs.scada_report,
        meter_report: inputs.meter_report,
    })
}
