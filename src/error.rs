//! Error taxonomy of the bridge and its HTTP mapping.

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::spool::SpoolError;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Malformed JSON or a failed required-field rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request body could not be read.
    #[error("{0}")]
    Body(String),

    #[error("Body too large")]
    PayloadTooLarge,

    #[error("Unauthorized (x-api-key)")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Spool(#[from] SpoolError),

    #[error("{0}")]
    Internal(String),
}

impl BridgeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Spool(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Server-side failures are remembered for `/health`.
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<BytesRejection> for BridgeError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::Body(rejection.body_text())
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
