use crate::models::KeyRole;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdpError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Key not found for {0} token")]
    KeyNotFound(KeyRole),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Token expiry out of range: {0}")]
    ExpiryOutOfRange(String),

    #[error("Internal server error")]
    Internal,
}

impl IdpError {
    /// Machine-readable code used in error bodies and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            IdpError::KeyGeneration(_) => "KEY_GENERATION_ERROR",
            IdpError::KeyNotFound(_) => "KEY_NOT_FOUND",
            IdpError::Signing(_) => "SIGNING_ERROR",
            IdpError::ExpiryOutOfRange(_) => "EXPIRY_OUT_OF_RANGE",
            IdpError::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for IdpError {
    fn into_response(self) -> Response {
        // Every failure is a server-side fault. Details stay in the logs.
        let message = match &self {
            IdpError::KeyNotFound(_) => "Signing key is not available",
            IdpError::KeyGeneration(_) | IdpError::Signing(_) => {
                "An internal cryptographic error occurred"
            }
            IdpError::ExpiryOutOfRange(_) | IdpError::Internal => "An internal error occurred",
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: message.to_string(),
            },
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response)).into_response()
    }
}
