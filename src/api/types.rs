//! API request, response and error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::analytics::MonthlyEnergy;
use crate::error::AnalysisError;
use crate::io::table::Table;

/// `GET /` body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// `POST /analyze/monthly-energy` body.
#[derive(Debug, Serialize)]
pub struct MonthlyEnergyResponse {
    pub monthly_data: Vec<MonthlyEnergy>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// Parts collected from a multipart upload.
///
/// Every part is optional here; handlers ask for the ones they need.
#[derive(Debug, Default)]
pub struct Upload {
    pub scada: Option<Table>,
    pub meter: Option<Table>,
    pub num_sim: Option<usize>,
    pub rated_capacity: Option<f64>,
}

impl Upload {
    pub fn require_scada(&mut self) -> Result<Table, ApiError> {
        self.scada
            .take()
            .ok_or_else(|| ApiError::bad_request("missing required file part `scada_file`"))
    }

    pub fn require_meter(&mut self) -> Result<Table, ApiError> {
        self.meter
            .take()
            .ok_or_else(|| ApiError::bad_request("missing required file part `meter_file`"))
    }
}

/// Error returned by handlers, rendered as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// 400 for malformed uploads.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// 500 for faults on our side.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    /// Maps an analysis error to 422 (caller-actionable) or 500.
    ///
    /// `context` prefixes the message, e.g. `"Analysis failed"`.
    pub fn from_analysis(context: &str, err: AnalysisError) -> Self {
        if err.is_client_error() {
            warn!(error = %err, "{context}");
            Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: format!("{context}: {err}"),
            }
        } else {
            error!(error = %err, "{context}");
            Self::internal(format!("Internal analysis error: {err}"))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_serializes() {
        let err = ErrorResponse {
            error: "bad input".to_string(),
        };
        let json = serde_json::to_value(&err).ok();
        assert_eq!(
            json.as_ref().and_then(|j| j.get("error")).and_then(|v| v.as_str()),
            Some("bad input")
        );
    }

    #[test]
    fn analysis_errors_map_to_status() {
        let schema = AnalysisError::Schema {
            scada_missing: vec!["power".to_string()],
            meter_missing: Vec::new(),
        };
        let api = ApiError::from_analysis("Analysis failed", schema);
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(api.message.starts_with("Analysis failed: "));
        assert!(api.message.contains("power"));

        let internal = ApiError::from_analysis(
            "Analysis failed",
            AnalysisError::UnexpectedEngine("boom".to_string()),
        );
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(internal.message.contains("boom"));
    }

    #[test]
    fn missing_parts_are_bad_requests() {
        let mut upload = Upload::default();
        let err = upload.require_meter().err();
        assert_eq!(err.map(|e| e.status), Some(StatusCode::BAD_REQUEST));
    }
}
