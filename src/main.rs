//! wind-analyst entry point: CLI wiring for one-off AEP runs and the API server.

use std::path::Path;
use std::process;

use tracing::{error, info};
use wind_analyst::aep::analyze;
use wind_analyst::config::AnalystConfig;
use wind_analyst::io::Table;
use wind_analyst::io::export::{export_covariate_csv, export_samples_csv};
use wind_analyst::logging;

/// Parsed CLI arguments.
struct CliArgs {
    scada_path: Option<String>,
    meter_path: Option<String>,
    config_path: Option<String>,
    num_sim_override: Option<usize>,
    seed_override: Option<u64>,
    samples_out: Option<String>,
    hourly_out: Option<String>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: Option<u16>,
}

fn print_help() {
    eprintln!("wind-analyst: long-term AEP estimation from SCADA and meter data");
    eprintln!();
    eprintln!("Usage: wind-analyst --scada <path> --meter <path> [OPTIONS]");
    #[cfg(feature = "api")]
    eprintln!("       wind-analyst --serve [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scada <path>           SCADA CSV (timestamp, wind_speed, power)");
    eprintln!("  --meter <path>           Meter CSV (timestamp, energy)");
    eprintln!("  --config <path>          Load settings from a TOML file");
    eprintln!("  --num-sim <usize>        Override the Monte Carlo trial count");
    eprintln!("  --seed <u64>             Fix the random seed");
    eprintln!("  --samples-out <path>     Write per-trial AEP to CSV");
    eprintln!("  --hourly-out <path>      Write the hourly covariate series to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start the REST API instead of a one-off run");
        eprintln!("  --port <u16>             API server port (default: from config, 8000)");
    }
    eprintln!("  --help                   Show this help message");
}

/// Returns the value following flag `args[*i]`, advancing `i`.
fn take_value(args: &[String], i: &mut usize, what: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("error: {} requires {what}", args[*i - 1]);
            process::exit(1);
        }
    }
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scada_path: None,
        meter_path: None,
        config_path: None,
        num_sim_override: None,
        seed_override: None,
        samples_out: None,
        hourly_out: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scada" => cli.scada_path = Some(take_value(&args, &mut i, "a path argument")),
            "--meter" => cli.meter_path = Some(take_value(&args, &mut i, "a path argument")),
            "--config" => cli.config_path = Some(take_value(&args, &mut i, "a path argument")),
            "--samples-out" => {
                cli.samples_out = Some(take_value(&args, &mut i, "a path argument"));
            }
            "--hourly-out" => {
                cli.hourly_out = Some(take_value(&args, &mut i, "a path argument"));
            }
            "--num-sim" => {
                let v = take_value(&args, &mut i, "a positive integer");
                match v.parse::<usize>() {
                    Ok(n) if n > 0 => cli.num_sim_override = Some(n),
                    _ => {
                        eprintln!("error: --num-sim value \"{v}\" is not a positive integer");
                        process::exit(1);
                    }
                }
            }
            "--seed" => {
                let v = take_value(&args, &mut i, "a u64 argument");
                if let Ok(s) = v.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{v}\" is not a valid u64");
                    process::exit(1);
                }
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                let v = take_value(&args, &mut i, "a u16 argument");
                if let Ok(p) = v.parse::<u16>() {
                    cli.port = Some(p);
                } else {
                    eprintln!("error: --port value \"{v}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn load_config(cli: &CliArgs) -> AnalystConfig {
    let mut config = match cli.config_path {
        Some(ref path) => match AnalystConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        },
        None => AnalystConfig::default(),
    };

    if let Err(e) = config.apply_env_overrides() {
        eprintln!("{e}");
        process::exit(1);
    }
    if let Some(n) = cli.num_sim_override {
        config.simulation.num_sim = n;
    }
    if let Some(seed) = cli.seed_override {
        config.simulation.seed = Some(seed);
    }
    #[cfg(feature = "api")]
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn read_table(path: &str, label: &str) -> Table {
    match Table::from_path(Path::new(path)) {
        Ok(table) => {
            info!(path, rows = table.len(), "{label} file loaded");
            table
        }
        Err(e) => {
            error!(path, error = %e, "failed to read {label} file");
            eprintln!("error: failed to read {label} file \"{path}\": {e}");
            process::exit(1);
        }
    }
}

fn run_once(cli: &CliArgs, config: &AnalystConfig) {
    let (Some(scada_path), Some(meter_path)) = (&cli.scada_path, &cli.meter_path) else {
        eprintln!("error: --scada and --meter are both required");
        print_help();
        process::exit(1);
    };
    let scada = read_table(scada_path, "SCADA");
    let meter = read_table(meter_path, "meter");

    let analysis = match analyze(&scada, &meter, config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(if e.is_client_error() { 2 } else { 1 });
        }
    };

    let w = &analysis.window;
    println!(
        "Analysis window: {} .. {} ({} days, buffer {} days)",
        w.start.format("%Y-%m-%d"),
        w.end.format("%Y-%m-%d"),
        w.duration_days,
        w.buffer_days
    );
    println!(
        "Hourly series: {} hours, {} gap-filled",
        analysis.hourly.len(),
        analysis.hourly.filled_hours
    );
    println!("\n{}", analysis.result);

    if let Some(ref path) = cli.samples_out {
        if let Err(e) = export_samples_csv(&analysis.result, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Samples written to {path}");
    }
    if let Some(ref path) = cli.hourly_out {
        if let Err(e) = export_covariate_csv(&analysis.covariate, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Covariate written to {path}");
    }
}

#[cfg(feature = "api")]
fn run_server(config: AnalystConfig) {
    use std::net::SocketAddr;
    use std::sync::Arc;

    let addr: SocketAddr = match format!("{}:{}", config.server.host, config.server.port).parse()
    {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!(
                "error: invalid bind address {}:{}: {e}",
                config.server.host, config.server.port
            );
            process::exit(1);
        }
    };
    let state = Arc::new(wind_analyst::api::AppState { config });
    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });
    if let Err(e) = rt.block_on(wind_analyst::api::serve(state, addr)) {
        error!(error = %e, "server stopped");
        eprintln!("error: server failed: {e}");
        process::exit(1);
    }
}

fn main() {
    let cli = parse_args();
    let config = load_config(&cli);
    logging::init(&config.server.log_level);

    #[cfg(feature = "api")]
    if cli.serve {
        run_server(config);
        return;
    }

    run_once(&cli, &config);
}
