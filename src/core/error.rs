// Centralized error handling for the staff desk

use axum::{
    extract::rejection::{FormRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

/// Rejections produced by the record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Username already exists")]
    AlreadyExists,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("You must be logged in to do that")]
    NotAuthenticated,

    #[error("You have already submitted an application")]
    DuplicateApplication,

    #[error("No application at index {index} ({len} stored)")]
    OutOfRange { index: usize, len: usize },

    #[error("Application has already been {0}")]
    NotPending(crate::models::application::ApplicationStatus),

    #[error("Stored value under '{key}' is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Errors returned by the HTTP front
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Admin access required")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {message}")]
    InvalidRequest { status: StatusCode, message: String },
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(err) => match err {
                StoreError::MissingField(_) => StatusCode::BAD_REQUEST,
                StoreError::AlreadyExists => StatusCode::CONFLICT,
                StoreError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                StoreError::NotAuthenticated => StatusCode::UNAUTHORIZED,
                StoreError::DuplicateApplication => StatusCode::CONFLICT,
                StoreError::OutOfRange { .. } => StatusCode::NOT_FOUND,
                StoreError::NotPending(_) => StatusCode::CONFLICT,
                StoreError::Corrupt { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use crate::models::api::ErrorResponse;

        let status = self.status();

        // Backend details stay in the log, not in the response body
        let error = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}
