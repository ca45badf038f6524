use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use common::image::ProviderError;
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::lifecycle::{LifecycleError, StoreError};

/// Seconds clients are told to wait while a model warms up.
const MODEL_LOADING_RETRY_SECS: u64 = 20;
const TIMEOUT_RETRY_SECS: u64 = 5;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `UNAUTHORIZED`,
    /// `NOT_FOUND`, `CONFLICT`, `PAYLOAD_TOO_LARGE`, `PROVIDER_UNAVAILABLE`,
    /// `PROVIDER_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Invalid end_time: end_time must be later than start_time")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Missing or wrong Basic credentials for the documentation.
    Unauthorized,
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    /// The image provider is temporarily unable to serve. Contains seconds
    /// until a retry is expected to succeed.
    ProviderUnavailable {
        message: String,
        retry_after: u64,
    },
    Provider(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "UNAUTHORIZED",
                    message: "Authentication required".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "PAYLOAD_TOO_LARGE",
                    message: msg,
                },
            ),
            AppError::ProviderUnavailable { message, .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    code: "PROVIDER_UNAVAILABLE",
                    message,
                },
            ),
            AppError::Provider(msg) => {
                tracing::warn!("Image provider error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "PROVIDER_ERROR",
                        message: msg,
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let extra_header = match &self {
            AppError::ProviderUnavailable { retry_after, .. } => {
                Some((header::RETRY_AFTER, retry_after.to_string()))
            }
            AppError::Unauthorized => Some((
                header::WWW_AUTHENTICATE,
                r#"Basic realm="API documentation""#.to_string(),
            )),
            _ => None,
        };

        let (status, body) = self.status_and_body();

        if let Some(h) = extra_header {
            (status, [h], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Asset '{key}' not found")),
            StorageError::InvalidKey(_) => AppError::Validation(err.to_string()),
            StorageError::SizeLimitExceeded { .. } => AppError::PayloadTooLarge(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ref e if e.is_invalid_input() => AppError::Validation(e.to_string()),
            ProviderError::ModelLoading => AppError::ProviderUnavailable {
                message: err.to_string(),
                retry_after: MODEL_LOADING_RETRY_SECS,
            },
            ProviderError::Timeout => AppError::ProviderUnavailable {
                message: err.to_string(),
                retry_after: TIMEOUT_RETRY_SECS,
            },
            other => AppError::Provider(other.to_string()),
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation { .. } => AppError::Validation(err.to_string()),
            LifecycleError::NotFound(_) => AppError::NotFound(err.to_string()),
            LifecycleError::Store(StoreError::Database(e)) => e.into(),
            LifecycleError::Store(StoreError::Asset(e)) => e.into(),
            LifecycleError::Provider(e) => e.into(),
        }
    }
}
