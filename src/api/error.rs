use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::GridError;

/// HTTP-facing failure, one variant per status the API can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("region rejected: {0}")]
    RegionRejected(String),

    #[error("not found: {0}")]
    Missing(String),

    #[error("invalid sample: {0}")]
    InvalidSample(String),

    #[error("storage unavailable: {0}")]
    StorageDown(String),

    #[error("engine failure: {0}")]
    Engine(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::RegionRejected(_) => StatusCode::BAD_REQUEST,
            ApiError::Missing(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidSample(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::StorageDown(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::RegionRejected(_) => "region_rejected",
            ApiError::Missing(_) => "not_found",
            ApiError::InvalidSample(_) => "invalid_sample",
            ApiError::StorageDown(_) => "storage_unavailable",
            ApiError::Engine(_) => "engine_failure",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Storage and engine details stay in the logs.
        let message = match &self {
            ApiError::Engine(detail) => {
                tracing::error!(error = %detail, "request failed inside the engine");
                "internal error".to_string()
            }
            ApiError::StorageDown(detail) => {
                tracing::warn!(error = %detail, "grid storage unavailable");
                "grid storage temporarily unavailable".to_string()
            }
            client => {
                tracing::debug!(error = %client, "request rejected");
                client.to_string()
            }
        };
        let body = ErrorBody {
            kind: self.kind(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<GridError> for ApiError {
    fn from(error: GridError) -> Self {
        match error {
            GridError::InvalidRegion(region) => ApiError::RegionRejected(region),
            e @ GridError::NoData { .. } => ApiError::Missing(e.to_string()),
            GridError::MalformedSample(msg) => ApiError::InvalidSample(msg),
            e @ GridError::Storage(_) => ApiError::StorageDown(e.to_string()),
            e @ (GridError::Solver(_) | GridError::JobAborted(_)) => ApiError::Engine(e.to_string()),
        }
    }
}
