//! `Authorization: Bearer` helpers for header collections.

use crate::errors::IssuerError;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};

const BEARER_PREFIX: &str = "Bearer ";

/// Build the `Bearer <token>` header value.
pub fn bearer_value(token: &str) -> Result<HeaderValue, IssuerError> {
    let mut value = HeaderValue::from_str(&format!("{BEARER_PREFIX}{token}"))
        .map_err(|e| IssuerError::InvalidHeaderValue(e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Bearer-token accessors for [`HeaderMap`].
pub trait BearerAuthExt {
    /// Replace any `Authorization` header with `Bearer <token>`.
    fn set_bearer_auth(&mut self, token: &str) -> Result<(), IssuerError>;

    /// Token from an `Authorization: Bearer` header, if present.
    fn bearer_token(&self) -> Option<&str>;
}

impl BearerAuthExt for HeaderMap {
    fn set_bearer_auth(&mut self, token: &str) -> Result<(), IssuerError> {
        // insert() drops every previous value for the name
        self.insert(AUTHORIZATION, bearer_value(token)?);
        Ok(())
    }

    fn bearer_token(&self) -> Option<&str> {
        self.get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
    }
}
