//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::{Rng, SeedableRng, rngs::StdRng};

use wind_analyst::config::AnalystConfig;
use wind_analyst::io::Table;

/// SCADA and meter samples every 10 minutes.
pub const SAMPLES_PER_DAY: i64 = 144;
pub const RATED_KW: f64 = 2000.0;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 2022-01-01 00:00.
pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date")
}

/// Idealized turbine: cubic between cut-in (3 m/s) and rated (12 m/s),
/// flat to cut-out (25 m/s).
pub fn turbine_power(ws: f64) -> f64 {
    if ws < 3.0 || ws > 25.0 {
        0.0
    } else if ws < 12.0 {
        RATED_KW * ((ws - 3.0) / 9.0).powi(3)
    } else {
        RATED_KW
    }
}

/// Generates `days` days of 10-minute SCADA and meter data from [`start`].
///
/// Each day draws a base wind speed in `[4, 12)` m/s and each sample adds
/// up to ±1 m/s, so daily energy tracks daily wind closely. Meter energy is
/// the 10-minute integral of SCADA power (kWh).
pub fn plant_tables(days: i64, seed: u64) -> (Table, Table) {
    plant_tables_without(days, seed, |_| false)
}

/// Like [`plant_tables`] but leaves out SCADA rows whose day index satisfies
/// `skip_day`. Meter rows are kept.
pub fn plant_tables_without(
    days: i64,
    seed: u64,
    skip_day: impl Fn(i64) -> bool,
) -> (Table, Table) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut scada_rows = Vec::new();
    let mut meter_rows = Vec::new();

    for day in 0..days {
        let base = rng.random_range(4.0..12.0);
        for step in 0..SAMPLES_PER_DAY {
            let time = start() + Duration::days(day) + Duration::minutes(10 * step);
            let ws: f64 = (base + rng.random_range(-1.0..1.0_f64)).max(0.0);
            let power = turbine_power(ws);
            let ts = time.format(TIMESTAMP_FORMAT).to_string();
            if !skip_day(day) {
                scada_rows.push(vec![ts.clone(), format!("{ws:.3}"), format!("{power:.3}")]);
            }
            meter_rows.push(vec![ts, format!("{:.4}", power * 10.0 / 60.0)]);
        }
    }

    (
        Table::new(vec!["timestamp", "wind_speed", "power"], scada_rows),
        Table::new(vec!["timestamp", "energy"], meter_rows),
    )
}

/// Re-aggregates a 10-minute meter table into totals of `days` days each,
/// stamped at the start of each period.
pub fn aggregate_meter(meter: &Table, days: usize) -> Table {
    let rows = meter
        .rows()
        .chunks(days * SAMPLES_PER_DAY as usize)
        .map(|chunk| {
            let total: f64 = chunk
                .iter()
                .filter_map(|row| row[1].parse::<f64>().ok())
                .sum();
            vec![chunk[0][0].clone(), format!("{total:.4}")]
        })
        .collect();
    Table::new(vec!["timestamp", "energy"], rows)
}

/// Default configuration with a fixed seed and trial count.
pub fn seeded_config(seed: u64, num_sim: usize) -> AnalystConfig {
    let mut config = AnalystConfig::default();
    config.simulation.seed = Some(seed);
    config.simulation.num_sim = num_sim;
    config
}

/// Serializes a table back to CSV text.
pub fn to_csv(table: &Table) -> String {
    let mut out = table.columns().join(",");
    out.push('\n');
    for row in table.rows() {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}
