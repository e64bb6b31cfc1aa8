use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::ml::{ArtifactError, PredictError};
use crate::threshold::ThresholdError;

/// Conditions that stop the service before it accepts connections.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request-level failures. All of them are the client's input.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("prediction failed: {0}")]
    Prediction(#[from] PredictError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::warn!("request rejected: {}", self);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
