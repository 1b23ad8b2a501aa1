//! TOML-based analyst configuration.

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Top-level configuration parsed from TOML.
///
/// Every section has defaults matching the behaviour of the hosted service,
/// so an empty file (or [`AnalystConfig::default`]) is a valid configuration.
/// The struct is passed explicitly into the pipeline; nothing reads it from
/// global state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalystConfig {
    /// Monte Carlo trial count and uncertainty model.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Defaults for absent auxiliary columns and request parameters.
    #[serde(default)]
    pub plant: PlantConfig,
    /// Placeholder values for the synthetic reanalysis series.
    #[serde(default)]
    pub covariate: CovariateConfig,
    /// HTTP server binding and log level.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Monte Carlo trial count and uncertainty model.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of Monte Carlo trials (must be > 0).
    pub num_sim: usize,
    /// Upper bound on `num_sim`, including per-request overrides.
    pub max_num_sim: usize,
    /// Fixed RNG seed; `None` draws fresh entropy for every run.
    pub seed: Option<u64>,
    /// Relative standard deviation of revenue-meter error.
    pub meter_uncertainty: f64,
    /// Relative standard deviation applied to availability and curtailment losses.
    pub loss_uncertainty: f64,
    /// Relative standard deviation of the long-term wind resource.
    pub wind_variability: f64,
    /// Length of the long-term reference window, in whole years.
    pub uncertainty_window_years: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_sim: 50,
            max_num_sim: 10_000,
            seed: None,
            meter_uncertainty: 0.005,
            loss_uncertainty: 0.05,
            wind_variability: 0.02,
            uncertainty_window_years: 1,
        }
    }
}

/// Defaults for absent auxiliary columns and request parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlantConfig {
    /// Asset identifier assigned to SCADA rows without an `asset_id` column.
    pub asset_id: String,
    /// Default rated capacity for capacity-factor requests (kW).
    pub rated_capacity_kw: f64,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            asset_id: "turbine_01".to_string(),
            rated_capacity_kw: 2000.0,
        }
    }
}

/// Placeholder values for the synthetic reanalysis series.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CovariateConfig {
    /// Constant wind direction attached to every covariate row (degrees).
    pub wind_direction_deg: f64,
    /// Constant air density attached to every covariate row (kg/m³).
    pub air_density: f64,
}

impl Default for CovariateConfig {
    fn default() -> Self {
        Self {
            wind_direction_deg: 180.0,
            air_density: 1.225,
        }
    }
}

/// HTTP server binding and log level.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Default `tracing` level when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.num_sim"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl AnalystConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Overrides the server section from `HOST`, `PORT` and `LOG_LEVEL`.
    ///
    /// Only the binary calls this; library code never reads the environment.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `PORT` is set but is not a valid `u16`.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError {
                field: "server.port".to_string(),
                message: format!("PORT value \"{port}\" is not a valid u16"),
            })?;
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.server.log_level = level.to_lowercase();
        }
        Ok(())
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.num_sim == 0 {
            errors.push(ConfigError {
                field: "simulation.num_sim".into(),
                message: "must be > 0".into(),
            });
        }
        if s.max_num_sim == 0 {
            errors.push(ConfigError {
                field: "simulation.max_num_sim".into(),
                message: "must be > 0".into(),
            });
        } else if s.num_sim > s.max_num_sim {
            errors.push(ConfigError {
                field: "simulation.num_sim".into(),
                message: format!(
                    "must be <= max_num_sim ({}), got {}",
                    s.max_num_sim, s.num_sim
                ),
            });
        }
        if s.uncertainty_window_years == 0 {
            errors.push(ConfigError {
                field: "simulation.uncertainty_window_years".into(),
                message: "must be >= 1".into(),
            });
        }
        for (field, value) in [
            ("simulation.meter_uncertainty", s.meter_uncertainty),
            ("simulation.loss_uncertainty", s.loss_uncertainty),
            ("simulation.wind_variability", s.wind_variability),
        ] {
            if !(0.0..1.0).contains(&value) {
                errors.push(ConfigError {
                    field: field.into(),
                    message: format!("must be in [0.0, 1.0), got {value}"),
                });
            }
        }

        let p = &self.plant;
        if p.asset_id.trim().is_empty() {
            errors.push(ConfigError {
                field: "plant.asset_id".into(),
                message: "must not be empty".into(),
            });
        }
        if p.rated_capacity_kw <= 0.0 {
            errors.push(ConfigError {
                field: "plant.rated_capacity_kw".into(),
                message: "must be > 0".into(),
            });
        }

        let c = &self.covariate;
        if !(0.0..360.0).contains(&c.wind_direction_deg) {
            errors.push(ConfigError {
                field: "covariate.wind_direction_deg".into(),
                message: "must be in [0, 360)".into(),
            });
        }
        if c.air_density <= 0.0 {
            errors.push(ConfigError {
                field: "covariate.air_density".into(),
                message: "must be > 0".into(),
            });
        }

        if !LOG_LEVELS.contains(&self.server.log_level.as_str()) {
            errors.push(ConfigError {
                field: "server.log_level".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    LOG_LEVELS.join(", "),
                    self.server.log_level
                ),
            });
        }

        errors
    }
}
