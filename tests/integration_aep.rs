//! Integration tests for the end-to-end AEP pipeline.

mod common;

use wind_analyst::aep::{
    AepEngine, EngineFailure, EngineInputs, MonteCarloAep, SimulationResult, WindowPolicy,
    analyze, run_aep, run_aep_with,
};
use wind_analyst::config::AnalystConfig;
use wind_analyst::error::AnalysisError;
use wind_analyst::io::Table;
use wind_analyst::io::export::write_samples_csv;

/// Engine that returns a canned answer without looking at its inputs.
struct StubEngine {
    outcome: Result<Vec<f64>, EngineFailure>,
    calls: usize,
}

impl StubEngine {
    fn new(outcome: Result<Vec<f64>, EngineFailure>) -> Self {
        Self { outcome, calls: 0 }
    }
}

impl AepEngine for StubEngine {
    fn simulate(&mut self, _inputs: &EngineInputs<'_>) -> Result<Vec<f64>, EngineFailure> {
        self.calls += 1;
        match &self.outcome {
            Ok(samples) => Ok(samples.clone()),
            Err(EngineFailure::Contract(msg)) => Err(EngineFailure::Contract(msg.clone())),
            Err(EngineFailure::Internal(msg)) => Err(EngineFailure::Internal(msg.clone())),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

#[test]
fn full_year_produces_ordered_estimates() {
    let (scada, meter) = common::plant_tables(365, 1);
    let mut config = AnalystConfig::default();
    config.simulation.seed = Some(42);

    let result = run_aep(&scada, &meter, &config).expect("a full year should be analysable");

    assert_eq!(result.num_samples(), 50);
    assert!(result.p90 > 0.0, "p90 should be positive: {}", result.p90);
    assert!(
        result.p50 >= result.p90,
        "p50 {} should not be below p90 {}",
        result.p50,
        result.p90
    );
    assert!(result.samples.iter().all(|s| s.is_finite() && *s >= 0.0));

    // Every sample is at most the rated output of a year.
    let max_mwh = common::RATED_KW * 24.0 * 365.0 / 1000.0;
    assert!(result.samples.iter().all(|s| *s < max_mwh));
}

#[test]
fn estimate_is_close_to_metered_production() {
    let (scada, meter) = common::plant_tables(365, 3);
    let config = common::seeded_config(7, 100);

    let analysis = analyze(&scada, &meter, &config).expect("a full year should be analysable");

    let metered_mwh: f64 = meter
        .rows()
        .iter()
        .filter_map(|row| row[1].parse::<f64>().ok())
        .sum::<f64>()
        / 1000.0;
    let rel = (analysis.result.p50 - metered_mwh).abs() / metered_mwh;
    assert!(
        rel < 0.15,
        "p50 {} should be near metered {metered_mwh} (rel {rel})",
        analysis.result.p50
    );
    assert_eq!(analysis.window.total_days, 365);
    assert_eq!(analysis.window.buffer_days, 0);
    assert_eq!(analysis.hourly.len(), 365 * 24);
    assert_eq!(analysis.hourly.filled_hours, 0);
    assert_eq!(analysis.covariate.missing_hours(), 0);
}

#[test]
fn same_seed_repeats_and_different_seeds_agree() {
    let (scada, meter) = common::plant_tables(365, 5);

    let a = run_aep(&scada, &meter, &common::seeded_config(1, 50)).expect("valid");
    let b = run_aep(&scada, &meter, &common::seeded_config(1, 50)).expect("valid");
    let c = run_aep(&scada, &meter, &common::seeded_config(2, 50)).expect("valid");

    assert_eq!(a, b);
    assert_within_ten_percent(&a, &c);
}

#[test]
fn unseeded_runs_agree() {
    let (scada, meter) = common::plant_tables(365, 5);
    let config = AnalystConfig::default();
    assert_eq!(config.simulation.seed, None);

    let first = run_aep(&scada, &meter, &config).expect("valid");
    let second = run_aep(&scada, &meter, &config).expect("valid");
    assert_within_ten_percent(&first, &second);
}

fn assert_within_ten_percent(a: &SimulationResult, b: &SimulationResult) {
    let p50 = (a.p50 - b.p50).abs() / a.p50;
    let p90 = (a.p90 - b.p90).abs() / a.p90;
    assert!(p50 < 0.10, "p50 drifted {p50}: {} vs {}", a.p50, b.p50);
    assert!(p90 < 0.10, "p90 drifted {p90}: {} vs {}", a.p90, b.p90);
}

#[test]
fn daily_and_weekly_meter_totals_agree() {
    let (scada, meter) = common::plant_tables(399, 6);
    let daily = common::aggregate_meter(&meter, 1);
    let weekly = common::aggregate_meter(&meter, 7);
    assert_eq!(daily.len(), 399);
    assert_eq!(weekly.len(), 57);

    let config = common::seeded_config(5, 50);
    let from_daily = run_aep(&scada, &daily, &config).expect("daily meter is valid");
    let from_weekly = run_aep(&scada, &weekly, &config).expect("weekly meter is valid");

    let rel = (from_daily.p50 - from_weekly.p50).abs() / from_daily.p50;
    assert!(
        rel < 0.10,
        "daily p50 {} vs weekly p50 {} (rel {rel})",
        from_daily.p50,
        from_weekly.p50
    );
    let max_mwh = common::RATED_KW * 24.0 * 365.0 / 1000.0;
    assert!(from_weekly.p50 < max_mwh, "weekly p50 {}", from_weekly.p50);
}

#[test]
fn missing_columns_are_all_reported() {
    let scada = Table::new(
        vec!["timestamp", "wind_speed"],
        vec![vec!["2022-01-01 00:00:00".to_string(), "5.0".to_string()]],
    );
    let meter = Table::new(
        vec!["timestamp", "kwh"],
        vec![vec!["2022-01-01 00:00:00".to_string(), "1.0".to_string()]],
    );

    match run_aep(&scada, &meter, &common::seeded_config(1, 10)) {
        Err(AnalysisError::Schema {
            scada_missing,
            meter_missing,
        }) => {
            assert_eq!(scada_missing, vec!["power".to_string()]);
            assert_eq!(meter_missing, vec!["energy".to_string()]);
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn half_year_is_insufficient() {
    let (scada, meter) = common::plant_tables(180, 1);
    let err = run_aep(&scada, &meter, &common::seeded_config(1, 10))
        .expect_err("180 days is too short");

    assert!(err.is_client_error());
    match err {
        AnalysisError::InsufficientData {
            raw_days,
            effective_days,
            required_days,
            ..
        } => {
            assert_eq!(raw_days, 180);
            assert_eq!(effective_days, 180);
            assert_eq!(required_days, 365);
        }
        other => panic!("expected insufficient data, got {other:?}"),
    }
}

#[test]
fn scada_gap_is_filled_before_simulation() {
    let (scada, meter) = common::plant_tables_without(365, 9, |day| day == 100);
    let analysis = analyze(&scada, &meter, &common::seeded_config(3, 20))
        .expect("a one-day SCADA gap should not block analysis");

    assert_eq!(analysis.hourly.filled_hours, 24);
    assert_eq!(analysis.hourly.len(), 365 * 24);
    assert_eq!(analysis.covariate.missing_hours(), 0);
    assert_eq!(analysis.result.num_samples(), 20);
}

#[test]
fn zero_trials_are_rejected_before_simulation() {
    let (scada, meter) = common::plant_tables(365, 1);
    let config = common::seeded_config(1, 0);
    let mut engine = StubEngine::new(Ok(Vec::new()));

    let err = run_aep_with(&scada, &meter, &config, &WindowPolicy::default(), &mut engine)
        .expect_err("zero trials is invalid");

    assert!(matches!(err, AnalysisError::InvalidInput(_)));
    assert_eq!(engine.calls, 0);
}

#[test]
fn oversized_trial_count_is_rejected_before_simulation() {
    let (scada, meter) = common::plant_tables(365, 1);
    let config = common::seeded_config(1, 1 << 42);
    let mut engine = StubEngine::new(Ok(Vec::new()));

    let err = run_aep_with(&scada, &meter, &config, &WindowPolicy::default(), &mut engine)
        .expect_err("trial count above the cap is invalid");

    assert!(
        matches!(err, AnalysisError::InvalidInput(ref m) if m.contains("at most 10000")),
        "{err:?}"
    );
    assert!(err.is_client_error());
    assert_eq!(engine.calls, 0);

    let err = run_aep(&scada, &meter, &config).expect_err("bundled engine is guarded too");
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
}

#[test]
fn short_window_never_reaches_the_engine() {
    let (scada, meter) = common::plant_tables(200, 1);
    let config = common::seeded_config(1, 3);
    let mut engine = StubEngine::new(Ok(vec![1.0, 2.0, 3.0]));

    let err = run_aep_with(&scada, &meter, &config, &WindowPolicy::default(), &mut engine)
        .expect_err("too short");

    assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    assert_eq!(engine.calls, 0);
}

#[test]
fn engine_failures_are_classified() {
    let (scada, meter) = common::plant_tables(365, 1);
    let config = common::seeded_config(1, 3);
    let policy = WindowPolicy::default();

    let mut contract = StubEngine::new(Err(EngineFailure::Contract("bad frame".to_string())));
    let err = run_aep_with(&scada, &meter, &config, &policy, &mut contract).expect_err("fails");
    assert!(matches!(err, AnalysisError::EngineIntegration(ref m) if m == "bad frame"));
    assert!(err.is_client_error());

    let mut internal = StubEngine::new(Err(EngineFailure::Internal("boom".to_string())));
    let err = run_aep_with(&scada, &meter, &config, &policy, &mut internal).expect_err("fails");
    assert!(matches!(err, AnalysisError::UnexpectedEngine(_)));
    assert!(!err.is_client_error());

    let mut short = StubEngine::new(Ok(vec![1.0]));
    let err = run_aep_with(&scada, &meter, &config, &policy, &mut short).expect_err("fails");
    assert!(matches!(err, AnalysisError::UnexpectedEngine(_)));
}

#[test]
fn stub_outcomes_are_summarized() {
    let (scada, meter) = common::plant_tables(365, 1);
    let config = common::seeded_config(1, 10);
    let samples: Vec<f64> = (1..=10).map(|i| f64::from(i) * 10.0).collect();
    let mut engine = StubEngine::new(Ok(samples));

    let analysis = run_aep_with(&scada, &meter, &config, &WindowPolicy::default(), &mut engine)
        .expect("stub succeeds");

    assert_eq!(analysis.result.p50, 55.0);
    assert_eq!(analysis.result.p90, 19.0);

    let mut buf = Vec::new();
    write_samples_csv(&analysis.result, &mut buf).expect("in-memory write");
    let text = String::from_utf8(buf).expect("utf-8");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("trial,aep_mwh"));
    assert_eq!(lines.next(), Some("0,10.00"));
    assert_eq!(text.lines().count(), 11);
}

#[test]
fn monte_carlo_engine_is_usable_directly() {
    let (scada, meter) = common::plant_tables(370, 4);
    let config = common::seeded_config(11, 15);
    let mut engine = MonteCarloAep::new(&config.simulation);

    let analysis = run_aep_with(&scada, &meter, &config, &WindowPolicy::default(), &mut engine)
        .expect("valid");
    assert_eq!(engine.name(), "monte-carlo-regression");
    assert_eq!(analysis.result.num_samples(), 15);
}
