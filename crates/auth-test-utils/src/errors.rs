use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while creating keys or issuing tokens.
///
/// None of these occur under normal operation; tests are expected to fail
/// fast on them.
#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("RSA key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Key encoding failed: {0}")]
    KeyEncoding(String),

    #[error("Token expiry out of range: {0}")]
    ExpiryOutOfRange(String),

    #[error("JWT signing operation failed: {0}")]
    Signing(String),

    #[error("Invalid Authorization header value: {0}")]
    InvalidHeaderValue(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Rejection returned by the test server's bearer middleware.
#[derive(Debug, Error)]
pub enum AuthRejection {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Invalid Authorization header format")]
    NotBearer,

    #[error("{0}")]
    InvalidToken(#[from] common::jwt::JwtValidationError),
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

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let code = match &self {
            AuthRejection::MissingHeader | AuthRejection::NotBearer => "MISSING_BEARER_TOKEN",
            AuthRejection::InvalidToken(_) => "INVALID_TOKEN",
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        });

        let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
        response.headers_mut().insert(
            axum::http::header::WWW_AUTHENTICATE,
            axum::http::HeaderValue::from_static("Bearer"),
        );
        response
    }
}
