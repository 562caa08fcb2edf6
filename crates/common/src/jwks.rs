//! JSON Web Key types (RFC 7517) for publishing RSA verification keys.

use serde::{Deserialize, Serialize};

/// RSA JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kid: String, // Key ID
    pub kty: String, // Key Type ("RSA")
    pub alg: String, // Algorithm ("RS256")
    #[serde(rename = "use")]
    pub use_: String, // Public key use ("sig")
    pub n: String,   // Modulus (base64url, big-endian)
    pub e: String,   // Public exponent (base64url, big-endian)
}

/// JSON Web Key Set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// Find a key by its `kid`.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

impl From<Jwk> for Jwks {
    fn from(jwk: Jwk) -> Self {
        Self { keys: vec![jwk] }
    }
}
