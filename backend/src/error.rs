//! Application error taxonomy and HTTP mapping.
//!
//! Every domain operation returns `AppResult<T>`; handlers convert the
//! error variant into a status code and a JSON body. Validation runs before
//! any mutation, so a failed request never leaves partial writes behind.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use shared::ErrorResponse;
use thiserror::Error;
use tracing::{error, warn};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("missing or invalid caller identity")]
    Unauthorized,

    #[error("database error: {message}")]
    Database { message: String },
}

impl AppError {
    pub fn not_found(entity: &'static str) -> Self {
        warn!(entity, "resource not found");
        AppError::NotFound { entity }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(%message, "validation error");
        AppError::Validation { message }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        let message = message.into();
        warn!(%message, "conflict");
        AppError::Conflict { message }
    }

    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        error!(%message, "database error");
        AppError::Database { message }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return AppError::conflict("a record with these values already exists");
            }
        }
        AppError::database(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
