use crate::config::ConfigError;
use crate::intake::EvidenceImportError;
use crate::scoring::{ScoringConfigError, ScoringServiceError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Intake(EvidenceImportError),
    ScoringConfig(ScoringConfigError),
    Scoring(ScoringServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Intake(err) => write!(f, "evidence intake error: {}", err),
            AppError::ScoringConfig(err) => write!(f, "scoring configuration error: {}", err),
            AppError::Scoring(err) => write!(f, "scoring error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Intake(err) => Some(err),
            AppError::ScoringConfig(err) => Some(err),
            AppError::Scoring(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Intake(_) => StatusCode::BAD_REQUEST,
            AppError::Scoring(
                ScoringServiceError::EmptyBatch | ScoringServiceError::InvalidLimit { .. },
            ) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::ScoringConfig(_)
            | AppError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<EvidenceImportError> for AppError {
    fn from(value: EvidenceImportError) -> Self {
        Self::Intake(value)
    }
}

impl From<ScoringConfigError> for AppError {
    fn from(value: ScoringConfigError) -> Self {
        Self::ScoringConfig(value)
    }
}

impl From<ScoringServiceError> for AppError {
    fn from(value: ScoringServiceError) -> Self {
        Self::Scoring(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intake_errors_are_client_errors() {
        let err = AppError::from(EvidenceImportError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing.csv",
        )));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_batch_is_a_client_error_and_outages_are_not() {
        let empty = AppError::from(ScoringServiceError::EmptyBatch);
        assert_eq!(empty.into_response().status(), StatusCode::BAD_REQUEST);

        let outage = AppError::from(ScoringServiceError::Repository(
            crate::scoring::RepositoryError::Unavailable("offline".to_string()),
        ));
        assert!(outage.to_string().starts_with("scoring error:"));
        assert_eq!(outage.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
