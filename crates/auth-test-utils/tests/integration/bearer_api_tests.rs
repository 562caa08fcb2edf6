//! End-to-end tests: tokens presented as bearer headers to a server that
//! registered the issuer's verifier.

use auth_test_utils::{
    init_test_tracing, HeaderMap, Jwks, TestApiServer, TokenIssuer, TokenRequest,
    TokenVerifier, UserClaims, ROLE_RECALL_READWRITE,
};
use chrono::Duration;

async fn whoami(server: &TestApiServer, headers: HeaderMap) -> reqwest::Result<reqwest::Response> {
    reqwest::Client::new()
        .get(format!("{}/api/v1/whoami", server.url()))
        .headers(headers)
        .send()
        .await
}

#[tokio::test]
async fn test_authorized_request_returns_claims() -> Result<(), anyhow::Error> {
    init_test_tracing();
    let issuer = TokenIssuer::new()?;
    let server = TestApiServer::spawn(&issuer).await?;

    let authorize = issuer.set_authorization(Some("SOME_USER"), &[ROLE_RECALL_READWRITE], &[])?;
    let mut headers = HeaderMap::new();
    authorize(&mut headers);

    let response = whoami(&server, headers).await?;
    assert_eq!(response.status(), 200);

    let claims: UserClaims = response.json().await?;
    assert_eq!(claims.user_name, "SOME_USER");
    assert_eq!(claims.user_id, "SOME_USER_ID");
    assert!(claims.has_role(ROLE_RECALL_READWRITE));

    Ok(())
}

#[tokio::test]
async fn test_missing_header_is_rejected() -> Result<(), anyhow::Error> {
    let issuer = TokenIssuer::new()?;
    let server = TestApiServer::spawn(&issuer).await?;

    let response = whoami(&server, HeaderMap::new()).await?;
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "MISSING_BEARER_TOKEN");

    Ok(())
}

#[tokio::test]
async fn test_non_bearer_scheme_is_rejected() -> Result<(), anyhow::Error> {
    let issuer = TokenIssuer::new()?;
    let server = TestApiServer::spawn(&issuer).await?;

    let mut headers = HeaderMap::new();
    headers.insert("authorization", "Basic dXNlcjpwdw==".parse()?);

    let response = whoami(&server, headers).await?;
    assert_eq!(response.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_expired_token_is_rejected() -> Result<(), anyhow::Error> {
    let issuer = TokenIssuer::new()?;
    let server = TestApiServer::spawn(&issuer).await?;

    let token = issuer.build_token(TokenRequest::new("alice").expires_in(Duration::seconds(-60)))?;
    let mut headers = HeaderMap::new();
    headers.insert("authorization", format!("Bearer {token}").parse()?);

    let response = whoami(&server, headers).await?;
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert_eq!(
        body["error"]["message"],
        "The access token is invalid or expired"
    );

    Ok(())
}

#[tokio::test]
async fn test_token_from_other_issuer_is_rejected() -> Result<(), anyhow::Error> {
    let trusted = TokenIssuer::new()?;
    let stranger = TokenIssuer::new()?;
    let server = TestApiServer::spawn(&trusted).await?;

    let authorize = stranger.set_authorization(None, &[], &[])?;
    let mut headers = HeaderMap::new();
    authorize(&mut headers);

    let response = whoami(&server, headers).await?;
    assert_eq!(response.status(), 401);

    Ok(())
}

#[tokio::test]
async fn test_published_jwks_verifies_issued_tokens() -> Result<(), anyhow::Error> {
    let issuer = TokenIssuer::new()?;
    let server = TestApiServer::spawn(&issuer).await?;

    let jwks: Jwks = reqwest::get(format!("{}/.well-known/jwks.json", server.url()))
        .await?
        .json()
        .await?;
    let jwk = jwks
        .find(issuer.key_id())
        .ok_or_else(|| anyhow::anyhow!("issuer key missing from JWKS"))?;

    let verifier = TokenVerifier::from_jwk(jwk)?;
    let token = issuer.build_token(TokenRequest::new("alice"))?;
    assert_eq!(verifier.verify(&token)?.user_name, "alice");

    Ok(())
}
