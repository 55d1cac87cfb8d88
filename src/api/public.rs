//! Public API types

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;

use crate::core::ConfigError;

// Errors

/// Every way a request can fail, mapped onto a status code. Delivery
/// failures for individual devices are not here: they are reported
/// inside a successful response.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or rejected caller credential
    Unauthorized(String),
    /// Malformed request body
    InvalidPayload(String),
    /// The caller may not perform this action
    Forbidden(String),
    /// The server lacks a setting this request needs
    Configuration(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Configuration(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthorized(msg)
            | ApiError::InvalidPayload(msg)
            | ApiError::Forbidden(msg) => msg.clone(),
            ApiError::Configuration(msg) => format!("Server configuration error: {}", msg),
            ApiError::Internal(err) => err.to_string(),
        }
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("{}", message);
        } else {
            tracing::warn!("Rejected request ({}): {}", status, message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`. Missing
/// configuration keeps its own category, everything else is internal.
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        match err.downcast::<ConfigError>() {
            Ok(config_err) => ApiError::Configuration(config_err.to_string()),
            Err(err) => ApiError::Internal(err),
        }
    }
}

// Re-export public types from each route

pub mod push {
    pub use crate::api::routes::push::public::*;
}

pub mod webhook {
    pub use crate::api::routes::webhook::public::*;
}
