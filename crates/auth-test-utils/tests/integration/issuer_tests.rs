//! Token issuance properties checked through the public API only.

use auth_test_utils::{
    init_test_tracing, BearerAuthExt, HeaderMap, JwtValidationError, TokenAssertions,
    TokenIssuer, TokenRequest, UserClaims, DEFAULT_CLIENT_ID, DEFAULT_USER,
    ROLE_RECALL_READWRITE, ROLE_TESTS_READWRITE, SCOPE_READ, SCOPE_WRITE, TEST_USER_SOME,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;

fn decode_payload(token: &str) -> serde_json::Value {
    let segment = token.split('.').nth(1).expect("token has a payload segment");
    serde_json::from_slice(&URL_SAFE_NO_PAD.decode(segment).expect("base64url payload"))
        .expect("JSON payload")
}

#[test]
fn test_user_id_defaults_to_subject_suffix() -> Result<(), anyhow::Error> {
    let issuer = TokenIssuer::new()?;

    for subject in ["alice", "SOME_USER", "x"] {
        let token = issuer.build_token(TokenRequest::new(subject))?;
        token.assert_user_id(&format!("{subject}_ID"));
    }

    Ok(())
}

#[test]
fn test_token_verifies_until_expiry_and_fails_after() -> Result<(), anyhow::Error> {
    let issuer = TokenIssuer::new()?;
    let verifier = issuer.verifier();

    let live = issuer.build_token(TokenRequest::new("alice").expires_in(Duration::seconds(30)))?;
    assert!(verifier.verify(&live).is_ok());

    let expired =
        issuer.build_token(TokenRequest::new("alice").expires_in(Duration::seconds(-1)))?;
    assert_eq!(verifier.verify(&expired), Err(JwtValidationError::Expired));

    Ok(())
}

#[test]
fn test_token_verifies_at_its_expiry_instant() -> Result<(), anyhow::Error> {
    let issuer = TokenIssuer::new()?;
    let verifier = issuer.verifier();

    // exp == now must still verify; retry if the clock ticks over mid-check
    for _ in 0..5 {
        let token = issuer.build_token(TokenRequest::new("alice").expires_in(Duration::zero()))?;
        let exp = decode_payload(&token)["exp"]
            .as_i64()
            .expect("exp is an integer");

        let result = verifier.verify(&token);
        if Utc::now().timestamp() == exp {
            assert!(result.is_ok(), "token rejected at its expiry instant: {result:?}");
            return Ok(());
        }
    }

    panic!("clock never held still long enough to check the expiry instant");
}

#[test]
fn test_generated_token_ids_are_unique() -> Result<(), anyhow::Error> {
    let issuer = TokenIssuer::new()?;

    let mut seen = HashSet::new();
    for _ in 0..50 {
        let token = issuer.build_token(TokenRequest::new("alice"))?;
        let jti = decode_payload(&token)["jti"]
            .as_str()
            .expect("jti is a string")
            .to_string();
        assert!(seen.insert(jti), "duplicate token id");
    }

    Ok(())
}

#[test]
fn test_claims_segment_round_trips_supplied_claims() -> Result<(), anyhow::Error> {
    let issuer = TokenIssuer::new()?;
    let token = issuer.build_token(
        TokenRequest::new("alice")
            .with_user_id("user-42")
            .with_client_id("other-client")
            .with_token_id("fixed-jti")
            .with_roles(&[ROLE_RECALL_READWRITE, ROLE_TESTS_READWRITE])
            .with_scopes(&[SCOPE_READ, SCOPE_WRITE]),
    )?;

    let payload = decode_payload(&token);
    assert_eq!(payload["user_name"], "alice");
    assert_eq!(payload["sub"], "alice");
    assert_eq!(payload["user_id"], "user-42");
    assert_eq!(payload["client_id"], "other-client");
    assert_eq!(payload["jti"], "fixed-jti");
    assert_eq!(
        payload["authorities"],
        serde_json::json!([ROLE_RECALL_READWRITE, ROLE_TESTS_READWRITE])
    );
    assert_eq!(payload["scope"], serde_json::json!([SCOPE_READ, SCOPE_WRITE]));

    let verified: UserClaims = issuer.verifier().verify(&token)?;
    let decoded: UserClaims = serde_json::from_value(payload)?;
    assert_eq!(verified, decoded);

    Ok(())
}

#[test]
fn test_default_authorization_scenario() -> Result<(), anyhow::Error> {
    init_test_tracing();
    let issuer = TokenIssuer::new()?;

    let issued_at = Utc::now().timestamp();
    let authorize = issuer.set_authorization(Some(DEFAULT_USER), &[], &[])?;

    let mut headers = HeaderMap::new();
    headers.insert("authorization", "Basic c3RhbGU=".parse()?);
    authorize(&mut headers);

    assert_eq!(headers.get_all("authorization").iter().count(), 1);
    let token = headers.bearer_token().expect("bearer header").to_string();
    assert_eq!(
        headers.get("authorization").map(|v| v.as_bytes().to_vec()),
        Some(format!("Bearer {token}").into_bytes())
    );

    token
        .assert_valid_jwt()
        .assert_for_subject("AUTH_ADM")
        .assert_client_id(DEFAULT_CLIENT_ID)
        .assert_user_id("AUTH_ADM_ID")
        .assert_no_roles()
        .assert_no_scopes()
        .assert_signed_by(issuer.key_id())
        .assert_expires_in(3600);

    let payload = decode_payload(&token);
    let exp = payload["exp"].as_i64().expect("exp is a number");
    assert!((exp - (issued_at + 3600)).abs() <= 5);

    Ok(())
}

#[test]
fn test_authorization_with_roles_and_scopes() -> Result<(), anyhow::Error> {
    let issuer = TokenIssuer::new()?;
    let authorize =
        issuer.set_authorization(Some(TEST_USER_SOME), &[ROLE_RECALL_READWRITE], &[SCOPE_READ])?;

    let mut headers = HeaderMap::new();
    authorize(&mut headers);

    let claims = issuer
        .verifier()
        .verify(headers.bearer_token().expect("bearer header"))?;
    assert_eq!(claims.user_name, TEST_USER_SOME);
    assert!(claims.has_role(ROLE_RECALL_READWRITE));
    assert!(claims.has_scope(SCOPE_READ));

    Ok(())
}

#[test]
fn test_issuers_never_cross_validate() -> Result<(), anyhow::Error> {
    let issuer_a = TokenIssuer::new()?;
    let issuer_b = TokenIssuer::new()?;

    let token_a = issuer_a.build_token(TokenRequest::new("alice"))?;
    let token_b = issuer_b.build_token(TokenRequest::new("alice"))?;

    assert_eq!(
        issuer_b.verifier().verify(&token_a),
        Err(JwtValidationError::InvalidSignature)
    );
    assert_eq!(
        issuer_a.verifier().verify(&token_b),
        Err(JwtValidationError::InvalidSignature)
    );
    assert_ne!(issuer_a.key_id(), issuer_b.key_id());

    Ok(())
}

#[test]
fn test_issuer_shared_across_threads() -> Result<(), anyhow::Error> {
    let issuer = Arc::new(TokenIssuer::new()?);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let issuer = Arc::clone(&issuer);
            std::thread::spawn(move || {
                issuer
                    .build_token(TokenRequest::new(&format!("user-{i}")))
                    .map_err(anyhow::Error::from)
            })
        })
        .collect();

    let verifier = issuer.verifier();
    for (i, handle) in handles.into_iter().enumerate() {
        let token = handle
            .join()
            .map_err(|_| anyhow::anyhow!("signing thread panicked"))??;
        assert_eq!(verifier.verify(&token)?.user_name, format!("user-{i}"));
    }

    Ok(())
}
