//! Test server harness for E2E testing
//!
//! Provides TestApiServer, a minimal HTTP API that registers an issuer's
//! verifier as its authentication dependency. Tests use it to check that
//! issued tokens and bearer headers are accepted end to end.

use crate::bearer::BearerAuthExt;
use crate::errors::AuthRejection;
use crate::issuer::TokenIssuer;
use crate::key_pair::{ClaimsSigner, VerifierSource};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use common::jwks::Jwks;
use common::jwt::{TokenVerifier, UserClaims};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::instrument;

/// Shared state for the test API routes.
pub struct AppState {
    pub verifier: TokenVerifier,
    pub jwks: Jwks,
}

/// Build the test API router.
///
/// - `GET /health` - liveness, plain text "OK"
/// - `GET /.well-known/jwks.json` - the issuer's public key
/// - `GET /api/v1/whoami` - requires a valid bearer token, echoes its claims
pub fn build_routes(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/api/v1/whoami", get(handle_whoami))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(handle_health))
        .route("/.well-known/jwks.json", get(handle_get_jwks))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Bearer authentication middleware.
///
/// Verifies the token with the registered verifier and stores the claims in
/// request extensions. Returns 401 when the header is missing, uses another
/// scheme or carries a token that fails verification.
#[instrument(skip_all, name = "auth_test_utils.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let headers = req.headers();
    if !headers.contains_key(AUTHORIZATION) {
        tracing::debug!(target: "auth_test_utils.middleware.auth", "Missing Authorization header");
        return Err(AuthRejection::MissingHeader);
    }

    let token = headers.bearer_token().ok_or_else(|| {
        tracing::debug!(
            target: "auth_test_utils.middleware.auth",
            "Invalid Authorization header format"
        );
        AuthRejection::NotBearer
    })?;

    let claims = state.verifier.verify(token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

async fn handle_health() -> &'static str {
    "OK"
}

async fn handle_get_jwks(State(state): State<Arc<AppState>>) -> Json<Jwks> {
    Json(state.jwks.clone())
}

async fn handle_whoami(Extension(claims): Extension<UserClaims>) -> Json<UserClaims> {
    Json(claims)
}

/// Test harness for spawning the test API in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_token_accepted() -> Result<(), anyhow::Error> {
///     let issuer = TokenIssuer::new()?;
///     let server = TestApiServer::spawn(&issuer).await?;
///
///     let mut headers = HeaderMap::new();
///     issuer.set_authorization(None, &[], &[])?(&mut headers);
///
///     let response = reqwest::Client::new()
///         .get(format!("{}/api/v1/whoami", server.url()))
///         .headers(headers)
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestApiServer {
    addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl TestApiServer {
    /// Spawn a server that trusts `issuer`'s tokens.
    pub async fn spawn<K: ClaimsSigner + VerifierSource>(
        issuer: &TokenIssuer<K>,
    ) -> Result<Self, anyhow::Error> {
        Self::spawn_with(issuer.verifier(), issuer.jwks()).await
    }

    /// Spawn a server with an explicit verifier and published key set.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with(verifier: TokenVerifier, jwks: Jwks) -> Result<Self, anyhow::Error> {
        let state = Arc::new(AppState { verifier, jwks });
        let app = build_routes(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                tracing::error!(target: "auth_test_utils.server", error = %e, "Test server error");
            }
        });

        tracing::debug!(target: "auth_test_utils.server", %addr, "Test API server listening");

        Ok(Self {
            addr,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestApiServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
