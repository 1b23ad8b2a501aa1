//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use tracing::{debug, error, info, warn};

use super::AppState;
use super::types::{ApiError, HealthResponse, MonthlyEnergyResponse, Upload};
use crate::aep::{SimulationResult, run_aep};
use crate::analytics::{
    CapacityFactor, DataQualitySummary, PowerCurve, WeibullFit, WindStatistics, capacity_factor,
    data_quality_summary, monthly_energy, power_curve, weibull_fit, wind_statistics,
};
use crate::error::AnalysisError;
use crate::io::table::Table;
use crate::series::normalize::{normalize_meter, normalize_scada};

/// `GET /` → 200 + `{"status": ...}`
pub async fn health() -> Json<HealthResponse> {
    debug!("health check requested");
    Json(HealthResponse {
        status: "wind-analyst API running".to_string(),
    })
}

/// Runs the AEP pipeline on uploaded SCADA and meter files.
///
/// `POST /analyze` (multipart: `scada_file`, `meter_file`, optional `num_sim`)
/// → 200 + `{"p50", "p90", "samples"}`
/// → 400 on upload problems, 422 on analysis errors the caller can fix
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<SimulationResult>, ApiError> {
    let mut upload = read_upload(multipart).await?;
    let scada = upload.require_scada()?;
    let meter = upload.require_meter()?;
    let mut config = state.config.clone();
    if let Some(num_sim) = upload.num_sim {
        let max = config.simulation.max_num_sim;
        if num_sim > max {
            warn!(num_sim, max, "trial count above the configured cap");
            return Err(ApiError::bad_request(format!(
                "num_sim must be at most {max}, got {num_sim}"
            )));
        }
        config.simulation.num_sim = num_sim;
    }
    info!(
        scada_rows = scada.len(),
        meter_rows = meter.len(),
        num_sim = config.simulation.num_sim,
        "analysis requested"
    );

    let result = run_blocking("Analysis failed", move || run_aep(&scada, &meter, &config)).await?;
    info!(p50 = result.p50, p90 = result.p90, "analysis completed");
    Ok(Json(result))
}

/// `POST /analyze/data-quality` (multipart: `scada_file`, `meter_file`)
pub async fn data_quality(multipart: Multipart) -> Result<Json<DataQualitySummary>, ApiError> {
    let mut upload = read_upload(multipart).await?;
    let scada = upload.require_scada()?;
    let meter = upload.require_meter()?;
    let summary = run_blocking("Data quality analysis failed", move || {
        data_quality_summary(&scada, &meter)
    })
    .await?;
    Ok(Json(summary))
}

/// `POST /analyze/wind-statistics` (multipart: `scada_file`)
pub async fn wind_stats(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<WindStatistics>, ApiError> {
    let scada = read_upload(multipart).await?.require_scada()?;
    let asset_id = state.config.plant.asset_id.clone();
    let stats = run_blocking("Wind statistics analysis failed", move || {
        let (scada, _) = normalize_scada(&scada, &asset_id)?;
        wind_statistics(&scada)
    })
    .await?;
    Ok(Json(stats))
}

/// `POST /analyze/weibull` (multipart: `scada_file`)
pub async fn weibull(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<WeibullFit>, ApiError> {
    let scada = read_upload(multipart).await?.require_scada()?;
    let asset_id = state.config.plant.asset_id.clone();
    let fit = run_blocking("Weibull analysis failed", move || {
        let (scada, _) = normalize_scada(&scada, &asset_id)?;
        weibull_fit(&scada)
    })
    .await?;
    Ok(Json(fit))
}

/// `POST /analyze/power-curve` (multipart: `scada_file`)
pub async fn power_curve_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<PowerCurve>, ApiError> {
    let scada = read_upload(multipart).await?.require_scada()?;
    let asset_id = state.config.plant.asset_id.clone();
    let curve = run_blocking("Power curve analysis failed", move || {
        let (scada, _) = normalize_scada(&scada, &asset_id)?;
        power_curve(&scada)
    })
    .await?;
    Ok(Json(curve))
}

/// `POST /analyze/monthly-energy` (multipart: `meter_file`)
pub async fn monthly(multipart: Multipart) -> Result<Json<MonthlyEnergyResponse>, ApiError> {
    let meter = read_upload(multipart).await?.require_meter()?;
    let monthly_data = run_blocking("Monthly energy analysis failed", move || {
        let (meter, _) = normalize_meter(&meter)?;
        monthly_energy(&meter)
    })
    .await?;
    Ok(Json(MonthlyEnergyResponse { monthly_data }))
}

/// `POST /analyze/capacity-factor` (multipart: `meter_file`, optional
/// `rated_capacity` in kW)
pub async fn capacity(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<CapacityFactor>, ApiError> {
    let mut upload = read_upload(multipart).await?;
    let meter = upload.require_meter()?;
    let rated_kw = upload
        .rated_capacity
        .unwrap_or(state.config.plant.rated_capacity_kw);
    info!(rated_kw, "capacity factor requested");
    let cf = run_blocking("Capacity factor analysis failed", move || {
        let (meter, _) = normalize_meter(&meter)?;
        capacity_factor(&meter, rated_kw)
    })
    .await?;
    Ok(Json(cf))
}

/// Runs CPU-bound analysis off the async executor.
async fn run_blocking<T, F>(context: &'static str, work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, AnalysisError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| {
            error!(error = %e, "analysis task did not complete");
            ApiError::internal("An unexpected error occurred")
        })?
        .map_err(|e| ApiError::from_analysis(context, e))
}

/// Collects the known parts of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "scada_file" => upload.scada = Some(read_csv_part(field, "SCADA").await?),
            "meter_file" => upload.meter = Some(read_csv_part(field, "Meter").await?),
            "num_sim" => {
                let text = read_text(field).await?;
                let num_sim = text
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        ApiError::bad_request(format!(
                            "num_sim must be a positive integer, got \"{text}\""
                        ))
                    })?;
                upload.num_sim = Some(num_sim);
            }
            "rated_capacity" => {
                let text = read_text(field).await?;
                let rated = text.trim().parse::<f64>().map_err(|_| {
                    ApiError::bad_request(format!(
                        "rated_capacity must be a number, got \"{text}\""
                    ))
                })?;
                upload.rated_capacity = Some(rated);
            }
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }
    Ok(upload)
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("unreadable form field: {e}")))
}

/// Reads one uploaded CSV file, which must have a `.csv` file name.
async fn read_csv_part(field: Field<'_>, label: &str) -> Result<Table, ApiError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    if !file_name.ends_with(".csv") {
        warn!(file = %file_name, "{label} upload is not a CSV file");
        return Err(ApiError::bad_request(format!("{label} file must be a CSV file")));
    }
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("failed to read {label} upload: {e}")))?;
    let table = Table::from_reader(bytes.as_ref())
        .map_err(|e| ApiError::bad_request(format!("Failed to parse {label} CSV file: {e}")))?;
    info!(
        file = %file_name,
        rows = table.len(),
        columns = table.columns().len(),
        "{label} file loaded"
    );
    Ok(table)
}
