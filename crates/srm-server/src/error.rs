//! API error taxonomy
//!
//! Client errors carry their short Spanish message; store errors carry only a
//! generic per-endpoint message, with the detail logged server-side at the
//! call site.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or empty.
    #[error("Datos incompletos")]
    MissingFields,

    /// The administrative key does not match.
    #[error("Clave incorrecta")]
    InvalidKey,

    /// Store failure. The payload is the generic message shown to callers,
    /// never the underlying error.
    #[error("{0}")]
    Internal(&'static str),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingFields => StatusCode::BAD_REQUEST,
            ApiError::InvalidKey => StatusCode::FORBIDDEN,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            success: false,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
