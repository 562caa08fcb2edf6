//! # Auth Test Utilities
//!
//! Mints RSA-signed JWTs for integration tests of HTTP APIs that accept
//! `Authorization: Bearer` user tokens.
//!
//! This crate provides:
//! - An in-memory RSA key pair per issuer (never persisted)
//! - TokenIssuer: signed tokens, the matching verifier and JWKS
//! - TokenRequest: named token inputs with default derivation
//! - Bearer header helpers and a ready-made authorization mutator
//! - Custom assertions (TokenAssertions trait)
//! - Server test harness (TestApiServer for E2E tests)
//! - Fixed test IDs (users, client ids, roles)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let issuer = TokenIssuer::new()?;
//!
//!     // Register with the system under test
//!     let verifier = issuer.verifier();
//!
//!     // Build a token
//!     let token = issuer.build_token(
//!         TokenRequest::new("alice").with_role(ROLE_RECALL_READWRITE),
//!     )?;
//!     token.assert_valid_jwt().assert_user_id("alice_ID");
//!
//!     // Or authorize a request directly
//!     let mut headers = HeaderMap::new();
//!     issuer.set_authorization(None, &[], &[])?(&mut headers);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod bearer;
pub mod config;
pub mod errors;
pub mod issuer;
pub mod key_pair;
pub mod observability;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use bearer::*;
pub use config::*;
pub use errors::*;
pub use issuer::*;
pub use key_pair::*;
pub use observability::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;

pub use axum::http::HeaderMap;
pub use common::jwks::{Jwk, Jwks};
pub use common::jwt::{JwtValidationError, TokenVerifier, UserClaims};
