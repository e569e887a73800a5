//! # Authentication Middleware
//!
//! Bearer token middleware that establishes who the caller is. What the
//! caller may do is decided later by the
//! [`AuthorizationGate`](crate::authz::AuthorizationGate).
//!
//! ## Token Format
//!
//! ```text
//! Bearer {user_id}:{secret}
//! ```
//!
//! The upstream token issuer forwards the user id together with the shared
//! secret. The secret is compared in constant time. When no secret is
//! configured (development only) the secret part is optional and ignored,
//! but a user id is still required.
//!
//! ## CallerIdentity
//!
//! Every authenticated request gets a [`CallerIdentity`] injected into the
//! request extensions. Handlers extract it via the `FromRequestParts` impl.

use axum::extract::Request;
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use backoffice_core::UserId;
use subtle::ConstantTimeEq;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::AppError;

// ── Shared secret ───────────────────────────────────────────────────────────

/// The shared bearer secret. Zeroed on drop, redacted in `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretToken(String);

impl SecretToken {
    /// Wrap a secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretToken([REDACTED])")
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    /// The caller's user id, passed to services as the requester.
    pub user_id: UserId,
}

/// Extracts the identity that the auth middleware injected into extensions.
/// Returns 401 if no identity is present.
#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Expected secret. `None` disables the secret check.
    pub token: Option<SecretToken>,
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of secrets. Unequal lengths still perform a
/// comparison so timing does not depend on where the mismatch is.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token of the form `{user_id}:{secret}`.
///
/// With `expected_secret == None` a bare `{user_id}` is also accepted.
pub fn parse_bearer_token(
    provided: &str,
    expected_secret: Option<&SecretToken>,
) -> Result<CallerIdentity, String> {
    let (user_part, secret) = match provided.split_once(':') {
        Some((user, secret)) => (user, Some(secret)),
        None => (provided, None),
    };

    if let Some(expected) = expected_secret {
        match secret {
            Some(secret) if constant_time_token_eq(secret, expected.expose()) => {}
            Some(_) => return Err("invalid bearer token".into()),
            None => return Err("invalid token format, expected {user_id}:{secret}".into()),
        }
    }

    let user_id = user_part
        .parse::<Uuid>()
        .map_err(|e| format!("invalid user id: {e}"))?;
    Ok(CallerIdentity {
        user_id: UserId::from_uuid(user_id),
    })
}

/// Bearer user id of a request, without verifying the secret. Used to key
/// per-caller rate limits.
pub(crate) fn bearer_user_hint(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.split_once(':').map_or(token, |(user, _)| user))
        .filter(|user| !user.is_empty())
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Validate the Bearer token and inject the [`CallerIdentity`].
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(provided) => parse_bearer_token(provided, config.token.as_ref()),
            None => Err("authorization header must use Bearer scheme".to_string()),
        },
        None => Err("missing authorization header".to_string()),
    };

    match identity {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(msg) => {
            tracing::warn!(reason = %msg, "authentication failed");
            AppError::Unauthorized(msg).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const USER: &str = "6f2b7c1e-3a55-4f0a-9a4e-0c8d2d3b9e11";

    async fn whoami(caller: CallerIdentity) -> String {
        caller.user_id.to_string()
    }

    fn test_app(token: Option<&str>) -> Router {
        let auth_config = AuthConfig {
            token: token.map(SecretToken::new),
        };
        Router::new()
            .route("/test", get(whoami))
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(auth_config))
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn valid_token_yields_caller() {
        let (status, body) =
            call(test_app(Some("s3cret")), Some(&format!("Bearer {USER}:s3cret"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, USER);
    }

    #[tokio::test]
    async fn wrong_secret_rejected() {
        let (status, body) =
            call(test_app(Some("s3cret")), Some(&format!("Bearer {USER}:guess"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("UNAUTHORIZED"));
        assert!(!body.contains("s3cret"));
    }

    #[tokio::test]
    async fn missing_header_rejected() {
        let (status, body) = call(test_app(Some("s3cret")), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("missing"));
    }

    #[tokio::test]
    async fn non_bearer_scheme_rejected() {
        let (status, _) = call(test_app(Some("s3cret")), Some("Basic dXNlcjpwYXNz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn secret_required_when_configured() {
        let (status, _) = call(test_app(Some("s3cret")), Some(&format!("Bearer {USER}"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn disabled_auth_still_requires_user_id() {
        let (status, body) = call(test_app(None), Some(&format!("Bearer {USER}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, USER);
        let (status, _) = call(test_app(None), Some("Bearer not-a-uuid")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(test_app(None), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn constant_time_eq_behaviour() {
        assert!(constant_time_token_eq("abc", "abc"));
        assert!(!constant_time_token_eq("abc", "abd"));
        assert!(!constant_time_token_eq("ab", "abc"));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let config = AuthConfig {
            token: Some(SecretToken::new("hunter2")),
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn bearer_hint_reads_user_part() {
        let request = Request::builder()
            .header("Authorization", format!("Bearer {USER}:whatever"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(bearer_user_hint(&request), Some(USER));
    }
}
