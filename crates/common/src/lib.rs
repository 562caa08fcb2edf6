//! Verifier-side JWT material shared by test issuers and the services they test.

#![warn(clippy::pedantic)]

/// Module for JWT claims, validation errors and the RS256 verifier
pub mod jwt;

/// Module for JSON Web Key types
pub mod jwks;
