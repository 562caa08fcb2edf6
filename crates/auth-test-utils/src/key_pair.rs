//! In-memory RSA signing key pair and the signing seams built on it
//!
//! A fresh key pair is generated for every issuer. Nothing is persisted;
//! only the public half ever leaves this module (PEM, JWK or a verifier).

use crate::errors::IssuerError;
use crate::test_ids::TEST_KEY_ID_PREFIX;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::jwks::Jwk;
use common::jwt::{TokenVerifier, UserClaims, SIGNING_ALGORITHM};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::rngs::OsRng;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::LineEnding;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use tracing::instrument;

/// Capability to sign a claim set into a compact JWS.
pub trait ClaimsSigner {
    /// Key id placed in the `kid` header of every signed token.
    fn key_id(&self) -> &str;

    /// Sign `claims` and return the compact token.
    fn sign(&self, claims: &UserClaims) -> Result<String, IssuerError>;
}

/// Capability to hand out public verification material.
pub trait VerifierSource {
    /// Verifier accepting tokens signed by the matching private key.
    fn verifier(&self) -> TokenVerifier;

    /// The public key as a JSON Web Key.
    fn jwk(&self) -> Jwk;
}

/// RSA key pair held in memory for the lifetime of an issuer.
pub struct RsaKeyPair {
    key_id: String,
    encoding_key: EncodingKey,
    public_key: RsaPublicKey,
    public_key_pem: String,
    verifier: TokenVerifier,
}

impl RsaKeyPair {
    /// Generate a new key pair with an RSA modulus of `bits` bits.
    ///
    /// # Example
    /// ```rust,ignore
    /// let keys = RsaKeyPair::generate(2048)?;
    /// assert!(keys.public_key_pem().starts_with("-----BEGIN RSA PUBLIC KEY-----"));
    /// ```
    #[instrument(skip_all)]
    pub fn generate(bits: usize) -> Result<Self, IssuerError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| IssuerError::KeyGeneration(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_key_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| IssuerError::KeyEncoding(format!("private key to PEM: {e}")))?;
        let public_key_pem = public_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| IssuerError::KeyEncoding(format!("public key to PEM: {e}")))?;

        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| IssuerError::KeyEncoding(format!("Invalid private key format: {e}")))?;
        let verifier = TokenVerifier::from_rsa_pem(&public_key_pem)
            .map_err(|e| IssuerError::KeyEncoding(e.to_string()))?;

        let key_id = format!("{TEST_KEY_ID_PREFIX}-{}", uuid::Uuid::new_v4().simple());

        tracing::debug!(
            target: "auth_test_utils.key_pair",
            key_id = %key_id,
            bits,
            "Generated RSA signing key pair"
        );

        Ok(Self {
            key_id,
            encoding_key,
            public_key,
            public_key_pem,
            verifier,
        })
    }

    /// Public key in PKCS#1 PEM format.
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }

    /// RSA modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public_key.size() * 8
    }
}

impl fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("key_id", &self.key_id)
            .field("bits", &self.bits())
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl ClaimsSigner for RsaKeyPair {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    #[instrument(skip_all)]
    fn sign(&self, claims: &UserClaims) -> Result<String, IssuerError> {
        let mut header = Header::new(SIGNING_ALGORITHM);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.key_id.clone());

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| IssuerError::Signing(e.to_string()))
    }
}

impl VerifierSource for RsaKeyPair {
    fn verifier(&self) -> TokenVerifier {
        self.verifier.clone()
    }

    fn jwk(&self) -> Jwk {
        Jwk {
            kid: self.key_id.clone(),
            kty: "RSA".to_string(),
            alg: "RS256".to_string(),
            use_: "sig".to_string(),
            n: URL_SAFE_NO_PAD.encode(self.public_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(self.public_key.e().to_bytes_be()),
        }
    }
}
