//! Bearer-token authentication for the networked binding
//!
//! [`AuthLayer`] is a Tower layer placed in front of the JSON-RPC handler.
//! It extracts `Authorization: Bearer <token>`, checks it with a
//! [`Validate`] implementation and either forwards the request (with
//! [`AuthInfo`] in the request extensions) or answers `401 Unauthorized`
//! with a JSON-RPC error (`-32001`, kind `AuthenticationError`). Rejected
//! requests never reach the dispatcher.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Layer;
use tower_service::Service;

use crate::config::BearerToken;

/// Result of an authentication attempt
#[derive(Debug, Clone)]
pub enum AuthResult {
    Authenticated(AuthInfo),
    Failed(AuthError),
}

/// Identity of an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfo {
    /// Non-secret identifier, safe to log
    pub client_id: String,
}

/// Authentication error
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AuthError {
    /// Error code (e.g. "invalid_token")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

// =============================================================================
// Validation Trait
// =============================================================================

/// Trait for validating credentials.
///
/// The credential is the token portion of the header, already trimmed.
pub trait Validate: Clone + Send + Sync + 'static {
    fn validate(&self, credential: &str) -> impl Future<Output = AuthResult> + Send;
}

/// Client id reported for callers holding the configured secret. Carries no
/// part of the secret, so it is safe to log.
pub const STATIC_BEARER_CLIENT_ID: &str = "static-bearer";

/// Validator comparing against the single configured bearer secret.
#[derive(Debug, Clone)]
pub struct StaticBearerValidator {
    token: Arc<BearerToken>,
}

impl StaticBearerValidator {
    pub fn new(token: BearerToken) -> Self {
        Self {
            token: Arc::new(token),
        }
    }
}

impl Validate for StaticBearerValidator {
    async fn validate(&self, token: &str) -> AuthResult {
        if constant_time_eq(token.as_bytes(), self.token.expose().as_bytes()) {
            AuthResult::Authenticated(AuthInfo {
                client_id: STATIC_BEARER_CLIENT_ID.to_string(),
            })
        } else {
            AuthResult::Failed(AuthError {
                code: "invalid_token".to_string(),
                message: "The provided bearer token is not valid".to_string(),
            })
        }
    }
}

/// Length-revealing but otherwise timing-independent comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// =============================================================================
// Authorization Header Parsing
// =============================================================================

/// Extract a bearer token from an Authorization header.
///
/// The scheme is matched case-insensitively; an empty token is treated as absent.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let (scheme, token) = auth_header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

// =============================================================================
// Auth Layer
// =============================================================================

/// A Tower layer that performs bearer authentication using a validator
#[derive(Debug, Clone)]
pub struct AuthLayer<V> {
    validator: V,
}

impl<V> AuthLayer<V> {
    pub fn new(validator: V) -> Self {
        Self { validator }
    }
}

impl<S, V: Clone> Layer<S> for AuthLayer<V> {
    type Service = AuthService<S, V>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            validator: self.validator.clone(),
        }
    }
}

/// Tower service that performs authentication on incoming requests.
///
/// Created by [`AuthLayer`].
#[derive(Debug, Clone)]
pub struct AuthService<S, V> {
    inner: S,
    validator: V,
}

#[cfg(feature = "http")]
impl<S, V> Service<axum::http::Request<axum::body::Body>> for AuthService<S, V>
where
    S: Service<axum::http::Request<axum::body::Body>, Response = axum::response::Response>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
    S::Error: Send,
    V: Validate,
{
    type Response = axum::response::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: axum::http::Request<axum::body::Body>) -> Self::Future {
        let credential = req
            .headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .map(|s| s.to_owned());

        // Take the service that was driven to readiness, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let validator = self.validator.clone();

        Box::pin(async move {
            let Some(credential) = credential else {
                tracing::warn!("Rejected request without bearer token");
                return Ok(unauthorized_response(
                    "Missing bearer token. Provide it via the Authorization header.",
                ));
            };

            match validator.validate(&credential).await {
                AuthResult::Authenticated(info) => {
                    tracing::debug!(client_id = %info.client_id, "Bearer token accepted");
                    let mut req = req;
                    req.extensions_mut().insert(info);
                    inner.call(req).await
                }
                AuthResult::Failed(err) => {
                    tracing::warn!(code = %err.code, "Rejected request with invalid bearer token");
                    Ok(unauthorized_response(&err.message))
                }
            }
        })
    }
}

/// HTTP 401 with a `WWW-Authenticate` challenge and a JSON-RPC error body.
#[cfg(feature = "http")]
fn unauthorized_response(message: &str) -> axum::response::Response {
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;

    use crate::error::JsonRpcError;
    use crate::protocol::JsonRpcResponse;

    let body = JsonRpcResponse::error(None, JsonRpcError::unauthorized(message));
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        axum::Json(body),
    )
        .into_response()
}
