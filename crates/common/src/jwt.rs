//! JWT verification material shared with systems under test.
//!
//! This module provides:
//! - The claim set carried by test user tokens ([`UserClaims`])
//! - Claim name constants
//! - Size limits for DoS prevention
//! - Key ID extraction from JWT headers
//! - An RS256 public-key verifier ([`TokenVerifier`])
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only RS256 is accepted
//! - Generic error messages prevent information leakage
//! - Identity fields in [`UserClaims`] are redacted in Debug output
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::TokenVerifier;
//!
//! let verifier = TokenVerifier::from_rsa_pem(&public_key_pem)?;
//! let claims = verifier.verify(token)?;
//! assert!(claims.has_role("ROLE_ADMIN"));
//! ```

use crate::jwks::Jwk;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::instrument;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this size are rejected BEFORE any parsing or cryptographic
/// operations. An RS256 user token with a handful of roles is ~700 bytes.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Signing algorithm used by every test token.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::RS256;

/// Claim carrying the subject's login name.
pub const CLAIM_USER_NAME: &str = "user_name";

/// Claim carrying granted roles. Absent when the token has no roles.
pub const CLAIM_AUTHORITIES: &str = "authorities";

/// Claim carrying granted scopes. Absent when the token has no scopes.
pub const CLAIM_SCOPE: &str = "scope";

/// Claim carrying the expiry timestamp.
pub const CLAIM_EXP: &str = "exp";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during JWT validation.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token is missing required `kid` header.
    #[error("The access token is invalid or expired")]
    MissingKid,

    /// Token `exp` is in the past.
    #[error("The access token is invalid or expired")]
    Expired,

    /// Signature does not match the verifier's public key.
    #[error("The access token is invalid or expired")]
    InvalidSignature,

    /// Token is well formed but fails another check (algorithm, required claims).
    #[error("The access token is invalid or expired")]
    Rejected,

    /// Public key material could not be turned into a verifier.
    #[error("Invalid verification key: {0}")]
    InvalidKey(String),
}

// =============================================================================
// Claims Types
// =============================================================================

/// Claims carried by a test user token.
///
/// `authorities` and `scope` are omitted from the serialized token when empty,
/// and default to empty when absent from a decoded token.
///
/// # Security
///
/// `sub`, `user_name` and `user_id` are redacted in Debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// Subject; always equal to `user_name`.
    pub sub: String,

    /// Login name of the subject.
    pub user_name: String,

    /// Internal user identifier.
    pub user_id: String,

    /// OAuth client the token was issued to.
    pub client_id: String,

    /// Granted roles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorities: Vec<String>,

    /// Granted scopes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,

    /// Unique token identifier.
    pub jti: String,

    /// Issued-at timestamp (Unix epoch seconds).
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,
}

impl fmt::Debug for UserClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserClaims")
            .field("sub", &"[REDACTED]")
            .field("user_name", &"[REDACTED]")
            .field("user_id", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("authorities", &self.authorities)
            .field("scope", &self.scope)
            .field("jti", &self.jti)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

impl UserClaims {
    /// Check if the token grants a specific role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.authorities.iter().any(|r| r == role)
    }

    /// Check if the token grants a specific scope.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.iter().any(|s| s == scope)
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing (denial-of-service prevention)
/// - This function does NOT validate the token signature
///
/// # Errors
///
/// Returns `JwtValidationError` variants:
/// - `TokenTooLarge` - Token exceeds size limit
/// - `MalformedToken` - Token format invalid (wrong structure, bad base64, invalid JSON)
/// - `MissingKid` - Token header missing `kid` field or `kid` is not a string
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    check_size(token)?;

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)
}

fn check_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}

// =============================================================================
// Verifier
// =============================================================================

/// RS256 verifier bound to a single RSA public key.
///
/// Checks the signature and `exp` (zero leeway). Claim contents such as roles
/// and scopes are left to the caller.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Build a verifier from an RSA public key in PEM format (PKCS#1 or SPKI).
    ///
    /// # Errors
    ///
    /// Returns `JwtValidationError::InvalidKey` if the PEM cannot be parsed.
    pub fn from_rsa_pem(pem: &str) -> Result<Self, JwtValidationError> {
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| JwtValidationError::InvalidKey(e.to_string()))?;
        Ok(Self::with_decoding_key(decoding_key))
    }

    /// Build a verifier from an RSA JSON Web Key.
    ///
    /// # Errors
    ///
    /// Returns `JwtValidationError::InvalidKey` if the JWK is not an RS256 RSA
    /// key or its modulus/exponent are not valid base64url.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, JwtValidationError> {
        if jwk.kty != "RSA" {
            return Err(JwtValidationError::InvalidKey(format!(
                "unexpected key type {}",
                jwk.kty
            )));
        }
        if jwk.alg != "RS256" {
            return Err(JwtValidationError::InvalidKey(format!(
                "unexpected algorithm {}",
                jwk.alg
            )));
        }

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| JwtValidationError::InvalidKey(e.to_string()))?;
        Ok(Self::with_decoding_key(decoding_key))
    }

    fn with_decoding_key(decoding_key: DecodingKey) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;
        // Audience is not part of the test claim set
        validation.validate_aud = false;
        validation.set_required_spec_claims(&[CLAIM_EXP]);

        Self {
            decoding_key,
            validation,
        }
    }

    /// Verify a token and return its [`UserClaims`].
    ///
    /// # Errors
    ///
    /// See [`TokenVerifier::verify_as`].
    pub fn verify(&self, token: &str) -> Result<UserClaims, JwtValidationError> {
        self.verify_as::<UserClaims>(token)
    }

    /// Verify a token and deserialize its claims into `T`.
    ///
    /// # Errors
    ///
    /// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
    /// - `MalformedToken` - Not a decodable JWT, or claims don't fit `T`
    /// - `Expired` - `exp` is in the past
    /// - `InvalidSignature` - Signed by a different key
    /// - `Rejected` - Any other validation failure
    #[instrument(skip_all)]
    pub fn verify_as<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtValidationError> {
        check_size(token)?;

        let token_data = decode::<T>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(target: "common.jwt", error = %e, "Token verification failed");
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtValidationError::Expired,
                ErrorKind::InvalidSignature => JwtValidationError::InvalidSignature,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => JwtValidationError::MalformedToken,
                _ => JwtValidationError::Rejected,
            }
        })?;

        tracing::debug!(target: "common.jwt", "Token validated successfully");
        Ok(token_data.claims)
    }
}

// =============================================================================
// Tests
// =============================================================================
