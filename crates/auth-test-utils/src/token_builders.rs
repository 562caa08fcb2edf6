//! Builder patterns for test token construction
//!
//! [`TokenRequest`] names every input of a token. Optional fields are filled
//! in when the request is resolved into claims:
//!
//! - `user_id` defaults to `<subject>_ID`
//! - `client_id` defaults to the issuer's configured client id
//! - `token_id` defaults to a random UUID v4

use crate::errors::IssuerError;
use crate::test_ids::USER_ID_SUFFIX;
use chrono::{DateTime, Duration, Utc};
use common::jwt::UserClaims;

/// Request for a single signed token.
///
/// # Example
/// ```rust,ignore
/// let token = issuer.build_token(
///     TokenRequest::new("alice")
///         .with_role("ROLE_ADMIN")
///         .with_scope("read")
///         .expires_in(Duration::minutes(5)),
/// )?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub subject: String,
    pub user_id: Option<String>,
    pub scopes: Vec<String>,
    pub roles: Vec<String>,
    pub expires_in: Duration,
    pub client_id: Option<String>,
    pub token_id: Option<String>,
}

impl TokenRequest {
    /// Create a request for `subject` that expires in one hour.
    pub fn new(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            user_id: None,
            scopes: Vec::new(),
            roles: Vec::new(),
            expires_in: Duration::hours(1),
            client_id: None,
            token_id: None,
        }
    }

    /// Override the derived user id
    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Add one scope
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scopes.push(scope.to_string());
        self
    }

    /// Replace all scopes
    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add one role
    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.push(role.to_string());
        self
    }

    /// Replace all roles
    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }

    /// Set the lifetime. Negative values produce an already expired token.
    pub fn expires_in(mut self, lifetime: Duration) -> Self {
        self.expires_in = lifetime;
        self
    }

    /// Set the client id
    pub fn with_client_id(mut self, client_id: &str) -> Self {
        self.client_id = Some(client_id.to_string());
        self
    }

    /// Set the token id (`jti`)
    pub fn with_token_id(mut self, token_id: &str) -> Self {
        self.token_id = Some(token_id.to_string());
        self
    }

    /// Resolve defaults and build the claim set as of `now`.
    pub fn into_claims(
        self,
        default_client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UserClaims, IssuerError> {
        let exp = now.checked_add_signed(self.expires_in).ok_or_else(|| {
            IssuerError::ExpiryOutOfRange(format!("{} after {now}", self.expires_in))
        })?;

        let user_id = self
            .user_id
            .unwrap_or_else(|| format!("{}{USER_ID_SUFFIX}", self.subject));
        let client_id = self
            .client_id
            .unwrap_or_else(|| default_client_id.to_string());
        let jti = self
            .token_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(UserClaims {
            sub: self.subject.clone(),
            user_name: self.subject,
            user_id,
            client_id,
            authorities: self.roles,
            scope: self.scopes,
            jti,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        })
    }
}
