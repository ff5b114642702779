//! Error types for the fleet reports server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: manager or admin access required")]
    Forbidden,

    #[error("No inspections found between {from} and {to}")]
    NoResultsInRange { from: String, to: String },

    /// Per-record failure. Recovered by skipping the record.
    #[error("Failed to render inspection {id}: {reason}")]
    RenderFailure { id: String, reason: String },

    #[error("Failed to fetch inspections: {0}")]
    FetchFailure(String),

    #[error("Failed to package export: {0}")]
    PackagingFailure(String),

    #[error("None of the {0} inspections could be rendered")]
    NothingRendered(usize),

    #[error("Export timed out after {0} seconds")]
    Timeout(u64),

    #[error("Export cancelled by client")]
    Cancelled,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) | Self::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NoResultsInRange { .. } => StatusCode::NOT_FOUND,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::RenderFailure { .. }
            | Self::FetchFailure(_)
            | Self::PackagingFailure(_)
            | Self::NothingRendered(_)
            | Self::Cancelled
            | Self::Database(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable summary shown to the client
    pub fn summary(&self) -> String {
        match self {
            Self::FetchFailure(_) | Self::Database(_) => "Failed to fetch inspections".to_string(),
            Self::PackagingFailure(_) => "Failed to generate PDF".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Underlying cause for server-side failures, if any
    pub fn details(&self) -> Option<String> {
        match self {
            Self::FetchFailure(msg) | Self::PackagingFailure(msg) | Self::Internal(msg) => {
                Some(msg.clone())
            }
            Self::Database(e) => Some(e.to_string()),
            _ => None,
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            error: err.summary(),
            details: err.details(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
