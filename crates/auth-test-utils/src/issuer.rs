//! Token issuer for integration tests
//!
//! Holds one signing key pair for its whole lifetime and mints RS256 tokens
//! from it. Construct one per test (or per suite) and pass it by reference to
//! whatever setup code needs tokens or the matching verifier.

use crate::bearer::bearer_value;
use crate::config::IssuerConfig;
use crate::errors::IssuerError;
use crate::key_pair::{ClaimsSigner, RsaKeyPair, VerifierSource};
use crate::test_ids::AUTHORIZATION_TOKEN_TTL_SECONDS;
use crate::token_builders::TokenRequest;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use common::jwks::Jwks;
use common::jwt::TokenVerifier;
use tracing::instrument;

/// Issues signed test tokens.
///
/// # Example
/// ```rust,ignore
/// let issuer = TokenIssuer::new()?;
///
/// // Register the verifier with the system under test
/// let verifier = issuer.verifier();
///
/// // Authorize a request
/// let authorize = issuer.set_authorization(None, &[ROLE_RECALL_READWRITE], &[])?;
/// let mut headers = HeaderMap::new();
/// authorize(&mut headers);
/// ```
#[derive(Debug)]
pub struct TokenIssuer<K = RsaKeyPair> {
    keys: K,
    config: IssuerConfig,
}

impl TokenIssuer<RsaKeyPair> {
    /// Create an issuer with a fresh 2048-bit key pair and default settings.
    pub fn new() -> Result<Self, IssuerError> {
        Self::from_config(IssuerConfig::default())
    }

    /// Create an issuer from `AUTH_TEST_*` environment variables.
    pub fn from_env() -> Result<Self, IssuerError> {
        Self::from_config(IssuerConfig::from_env()?)
    }

    /// Create an issuer with a fresh key pair sized by `config.key_bits`.
    pub fn from_config(config: IssuerConfig) -> Result<Self, IssuerError> {
        let keys = RsaKeyPair::generate(config.key_bits)?;
        Ok(Self::with_keys(keys, config))
    }
}

impl<K: ClaimsSigner + VerifierSource> TokenIssuer<K> {
    /// Create an issuer around existing signing material.
    pub fn with_keys(keys: K, config: IssuerConfig) -> Self {
        Self { keys, config }
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Key id stamped into every token header.
    pub fn key_id(&self) -> &str {
        self.keys.key_id()
    }

    /// Verifier accepting tokens from this issuer only.
    pub fn verifier(&self) -> TokenVerifier {
        self.keys.verifier()
    }

    /// The issuer's public key as a one-entry JWKS.
    pub fn jwks(&self) -> Jwks {
        Jwks::from(self.keys.jwk())
    }

    /// Build and sign a token.
    ///
    /// Expiry is `now + request.expires_in`; the lifetime is not checked, so a
    /// negative value yields a token that is already expired. Only a lifetime
    /// that overflows the timestamp range is rejected.
    #[instrument(skip_all)]
    pub fn build_token(&self, request: TokenRequest) -> Result<String, IssuerError> {
        let claims = request.into_claims(&self.config.client_id, Utc::now())?;

        let token = self.keys.sign(&claims)?;

        tracing::debug!(
            target: "auth_test_utils.issuer",
            key_id = %self.keys.key_id(),
            jti = %claims.jti,
            exp = claims.exp,
            roles = claims.authorities.len(),
            scopes = claims.scope.len(),
            "Issued test token"
        );

        Ok(token)
    }

    /// Build a token that expires one hour after issuance and return a closure that sets `Authorization: Bearer <token>` on a header
    /// map, replacing any previous value.
    ///
    /// `user` defaults to the configured default user (`AUTH_ADM`).
    pub fn set_authorization(
        &self,
        user: Option<&str>,
        roles: &[&str],
        scopes: &[&str],
    ) -> Result<impl Fn(&mut HeaderMap) + Clone + Send + Sync + 'static, IssuerError> {
        let subject = user.unwrap_or(self.config.default_user.as_str());
        let token = self.build_token(
            TokenRequest::new(subject)
                .with_roles(roles)
                .with_scopes(scopes)
                .expires_in(Duration::seconds(AUTHORIZATION_TOKEN_TTL_SECONDS)),
        )?;
        let value = bearer_value(&token)?;

        Ok(move |headers: &mut HeaderMap| {
            headers.insert(AUTHORIZATION, value.clone());
        })
    }
}
