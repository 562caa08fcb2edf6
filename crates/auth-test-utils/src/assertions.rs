//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions on issued token strings. They only decode
//! the segments; signature checks belong to [`common::jwt::TokenVerifier`].

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use common::jwt::{extract_kid, UserClaims, CLAIM_AUTHORITIES, CLAIM_SCOPE};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

fn segment(token: &str, index: usize, name: &str) -> Vec<u8> {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no {name} segment"));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT {name}: {e}"))
}

fn claims(token: &str) -> UserClaims {
    serde_json::from_slice(&segment(token, 1, "payload"))
        .unwrap_or_else(|e| panic!("Failed to parse JWT claims JSON: {e}"))
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_subject("AUTH_ADM")
///     .assert_has_role("ROLE_PPUD_AUTOMATION__RECALL__READWRITE")
///     .assert_expires_in(3600);
/// ```
pub trait TokenAssertions {
    /// Assert that the token is a well-formed RS256 JWT carrying user claims
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that `user_name` and `sub` equal the subject
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert the `user_id` claim
    fn assert_user_id(&self, user_id: &str) -> &Self;

    /// Assert the `client_id` claim
    fn assert_client_id(&self, client_id: &str) -> &Self;

    /// Assert that the token contains the specified role
    fn assert_has_role(&self, role: &str) -> &Self;

    /// Assert that the token contains the specified scope
    fn assert_has_scope(&self, scope: &str) -> &Self;

    /// Assert that the `authorities` claim is absent
    fn assert_no_roles(&self) -> &Self;

    /// Assert that the `scope` claim is absent
    fn assert_no_scopes(&self) -> &Self;

    /// Assert that the token was signed by the specified key
    fn assert_signed_by(&self, key_id: &str) -> &Self;

    /// Assert that the token expires within the specified seconds
    fn assert_expires_in(&self, seconds: i64) -> &Self;
}

impl TokenAssertions for str {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {parts}"
        );

        let header: JwtHeader = serde_json::from_slice(&segment(self, 0, "header"))
            .unwrap_or_else(|e| panic!("Failed to parse JWT header JSON: {e}"));
        assert_eq!(header.alg, "RS256", "Expected RS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        claims(self);
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(
            claims.user_name, subject,
            "Expected user_name '{}', got '{}'",
            subject, claims.user_name
        );
        assert_eq!(claims.sub, subject, "Expected sub '{subject}'");
        self
    }

    fn assert_user_id(&self, user_id: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(
            claims.user_id, user_id,
            "Expected user_id '{}', got '{}'",
            user_id, claims.user_id
        );
        self
    }

    fn assert_client_id(&self, client_id: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(
            claims.client_id, client_id,
            "Expected client_id '{}', got '{}'",
            client_id, claims.client_id
        );
        self
    }

    fn assert_has_role(&self, role: &str) -> &Self {
        let claims = claims(self);
        assert!(
            claims.has_role(role),
            "Token does not contain role '{}'. Available roles: {:?}",
            role,
            claims.authorities
        );
        self
    }

    fn assert_has_scope(&self, scope: &str) -> &Self {
        let claims = claims(self);
        assert!(
            claims.has_scope(scope),
            "Token does not contain scope '{}'. Available scopes: {:?}",
            scope,
            claims.scope
        );
        self
    }

    fn assert_no_roles(&self) -> &Self {
        let raw: serde_json::Value = serde_json::from_slice(&segment(self, 1, "payload"))
            .expect("Failed to parse JWT claims");
        assert!(
            raw.get(CLAIM_AUTHORITIES).is_none(),
            "Expected no authorities claim, got {}",
            raw[CLAIM_AUTHORITIES]
        );
        self
    }

    fn assert_no_scopes(&self) -> &Self {
        let raw: serde_json::Value = serde_json::from_slice(&segment(self, 1, "payload"))
            .expect("Failed to parse JWT claims");
        assert!(
            raw.get(CLAIM_SCOPE).is_none(),
            "Expected no scope claim, got {}",
            raw[CLAIM_SCOPE]
        );
        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        let kid = extract_kid(self).expect("JWT header has no usable kid");
        assert_eq!(kid, key_id, "Expected key_id '{key_id}', got '{kid}'");
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let claims = claims(self);
        let now = chrono::Utc::now().timestamp();
        let expires_in = claims.exp - now;

        // Allow 5-second tolerance for slow test machines
        assert!(
            (expires_in - seconds).abs() <= 5,
            "Expected token to expire in {seconds} seconds, but expires in {expires_in} seconds"
        );
        self
    }
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        self.as_str().assert_valid_jwt();
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        self.as_str().assert_for_subject(subject);
        self
    }

    fn assert_user_id(&self, user_id: &str) -> &Self {
        self.as_str().assert_user_id(user_id);
        self
    }

    fn assert_client_id(&self, client_id: &str) -> &Self {
        self.as_str().assert_client_id(client_id);
        self
    }

    fn assert_has_role(&self, role: &str) -> &Self {
        self.as_str().assert_has_role(role);
        self
    }

    fn assert_has_scope(&self, scope: &str) -> &Self {
        self.as_str().assert_has_scope(scope);
        self
    }

    fn assert_no_roles(&self) -> &Self {
        self.as_str().assert_no_roles();
        self
    }

    fn assert_no_scopes(&self) -> &Self {
        self.as_str().assert_no_scopes();
        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        self.as_str().assert_signed_by(key_id);
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        self.as_str().assert_expires_in(seconds);
        self
    }
}
