//! Integration tests for the descriptive analytics on generated plant data.

mod common;

use wind_analyst::analytics::{
    capacity_factor, data_quality_summary, monthly_energy, power_curve, weibull_fit,
    wind_statistics,
};
use wind_analyst::series::normalize::{normalize_meter, normalize_scada};

#[test]
fn clean_uploads_score_full_quality() {
    let (scada, meter) = common::plant_tables(30, 21);
    let summary = data_quality_summary(&scada, &meter).expect("valid tables");

    assert_eq!(summary.scada.total_rows, 30 * 144);
    assert_eq!(summary.scada.total_columns, 3);
    assert_eq!(summary.scada.inferred_frequency, "10min");
    assert_eq!(summary.scada.duplicate_timestamps, 0);
    assert_eq!(summary.scada.time_coverage_days, 29.99);
    assert_eq!(summary.scada.start_date, "2022-01-01T00:00:00");
    assert_eq!(summary.scada.completeness_score, 100.0);
    assert_eq!(summary.meter.completeness_score, 100.0);
    assert_eq!(summary.overall_quality_score, 100.0);
}

#[test]
fn wind_distribution_matches_generator() {
    let (scada, _) = common::plant_tables(30, 22);
    let (scada, report) = normalize_scada(&scada, "T1").expect("schema ok");
    assert_eq!(report.kept_rows, 30 * 144);

    let stats = wind_statistics(&scada).expect("non-empty");
    assert!(stats.min >= 3.0 && stats.max <= 13.0, "{stats:?}");
    assert!(stats.mean > 4.0 && stats.mean < 12.0, "{stats:?}");
    assert_eq!(stats.histogram_counts.iter().sum::<usize>(), 30 * 144);
    assert_eq!(stats.histogram_bins.len(), stats.histogram_counts.len() + 1);

    let fit = weibull_fit(&scada).expect("positive spread");
    assert_eq!(fit.valid_samples, 30 * 144);
    assert!(fit.shape_k > 1.0, "{fit:?}");
    assert!(fit.scale_c > 4.0 && fit.scale_c < 14.0, "{fit:?}");
    assert!((fit.mean_weibull - stats.mean).abs() < 1.0, "{fit:?} vs {stats:?}");
}

#[test]
fn power_curve_follows_turbine_model() {
    let (scada, _) = common::plant_tables(60, 23);
    let (scada, _) = normalize_scada(&scada, "T1").expect("schema ok");
    let curve = power_curve(&scada).expect("non-empty");

    assert_eq!(curve.summary.total_records, 60 * 144);
    assert!(curve.summary.max_power <= common::RATED_KW);
    assert!(curve.summary.max_power > 0.0);
    let cut_in = curve.summary.cut_in_speed.expect("turbine produces above 4 m/s");
    assert!((4.5..=5.5).contains(&cut_in), "cut-in at {cut_in}");

    // Below cut-in the bins are empty or near zero.
    for (centre, avg) in curve.wind_speed_bins.iter().zip(&curve.avg_power_per_bin) {
        if *centre < 3.0 {
            assert!(avg.is_none_or(|p| p == 0.0), "bin {centre}: {avg:?}");
        }
    }
    // Mean power rises with wind speed across populated bins.
    let populated: Vec<f64> = curve
        .avg_power_per_bin
        .iter()
        .zip(&curve.count_per_bin)
        .filter(|(_, n)| **n > 20)
        .filter_map(|(p, _)| *p)
        .collect();
    assert!(populated.windows(2).all(|w| w[1] >= w[0]), "{populated:?}");
}

#[test]
fn monthly_energy_splits_calendar_months() {
    // January and February 2022.
    let (_, meter) = common::plant_tables(59, 24);
    let (meter, _) = normalize_meter(&meter).expect("schema ok");
    let months = monthly_energy(&meter).expect("has energy");

    assert_eq!(months.len(), 2);
    assert_eq!(months[0].month, "2022-01");
    assert_eq!(months[0].days, 31);
    assert_eq!(months[0].records, 31 * 144);
    assert_eq!(months[1].month, "2022-02");
    assert_eq!(months[1].days, 28);

    let total_mwh = meter.total_energy_kwh() / 1000.0;
    let summed: f64 = months.iter().map(|m| m.energy).sum();
    assert!((summed - total_mwh).abs() < 0.05, "{summed} vs {total_mwh}");
}

#[test]
fn capacity_factor_is_a_fraction_of_rated_output() {
    let (_, meter) = common::plant_tables(30, 25);
    let (meter, _) = normalize_meter(&meter).expect("schema ok");
    let cf = capacity_factor(&meter, common::RATED_KW).expect("valid");

    assert!(cf.capacity_factor > 0.0 && cf.capacity_factor < 100.0, "{cf:?}");
    assert_eq!(cf.rated_capacity_mw, 2.0);
    assert_eq!(cf.period.start, "2022-01-01T00:00:00");
    assert_eq!(cf.period.end, "2022-01-30T23:50:00");
    assert!((cf.capacity_factor_decimal * 100.0 - cf.capacity_factor).abs() < 0.02);
}
