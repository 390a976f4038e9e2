//! Request-level error type and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use crate::web::ErrorResponse;

/// Message returned to clients for every 5xx. Details only go to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Errors surfaced by request handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::InvalidRequest(message) => message.clone(),
            Self::Database(_) | Self::Io(_) => {
                error!(error = %self, "Request failed");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
