//! Issuer configuration.
//!
//! Every setting has a default, so most tests use [`IssuerConfig::default`].
//! Environment overrides exist for suites that need a larger key or a
//! different client id.

use crate::test_ids::{DEFAULT_CLIENT_ID, DEFAULT_USER};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default RSA modulus size in bits.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Accepted RSA modulus sizes in bits.
pub const ALLOWED_KEY_BITS: [usize; 3] = [2048, 3072, 4096];

#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// RSA modulus size for the generated key pair.
    pub key_bits: usize,
    /// Client id used when a token request doesn't name one.
    pub client_id: String,
    /// Subject used by `set_authorization` when no user is given.
    pub default_user: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            key_bits: DEFAULT_KEY_BITS,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            default_user: DEFAULT_USER.to_string(),
        }
    }
}

impl IssuerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let key_bits = match vars.get("AUTH_TEST_KEY_BITS") {
            Some(raw) => {
                let bits: usize = raw.parse().map_err(|_| invalid("AUTH_TEST_KEY_BITS", raw))?;
                if !ALLOWED_KEY_BITS.contains(&bits) {
                    return Err(ConfigError::InvalidValue {
                        name: "AUTH_TEST_KEY_BITS".to_string(),
                        reason: format!("expected one of {ALLOWED_KEY_BITS:?}, got {bits}"),
                    });
                }
                bits
            }
            None => defaults.key_bits,
        };

        let client_id = non_empty(vars, "AUTH_TEST_CLIENT_ID")?.unwrap_or(defaults.client_id);
        let default_user =
            non_empty(vars, "AUTH_TEST_DEFAULT_USER")?.unwrap_or(defaults.default_user);

        Ok(IssuerConfig {
            key_bits,
            client_id,
            default_user,
        })
    }
}

fn invalid(name: &str, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("not an integer: {raw:?}"),
    }
}

fn non_empty(vars: &HashMap<String, String>, name: &str) -> Result<Option<String>, ConfigError> {
    match vars.get(name) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must not be empty".to_string(),
        }),
        Some(value) => Ok(Some(value.clone())),
        None => Ok(None),
    }
}
