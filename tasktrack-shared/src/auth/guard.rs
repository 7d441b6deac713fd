//! Bearer authentication guard
//!
//! Resolves the `Authorization: Bearer <token>` header of a request into the
//! authenticated user before any handler logic runs. Every failure (missing
//! header, other scheme, bad token) is the same `AuthError::Unauthenticated`,
//! answered with one constant 401 body.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::{middleware, routing::get, Extension, Router};
//! use chrono::Duration;
//! use tasktrack_shared::auth::guard::{bearer_auth_middleware, AuthUser};
//! use tasktrack_shared::auth::token::{TokenConfig, TokenService};
//!
//! async fn whoami(Extension(auth): Extension<AuthUser>) -> String {
//!     auth.user_id.to_string()
//! }
//!
//! let tokens = Arc::new(TokenService::new(TokenConfig {
//!     secret: "test-secret-key-at-least-32-bytes-long".to_string(),
//!     ttl: Duration::minutes(30),
//! }));
//!
//! let app: Router = Router::new()
//!     .route("/me", get(whoami))
//!     .layer(middleware::from_fn_with_state(tokens, bearer_auth_middleware));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::token::TokenService;

/// Message returned for every authentication failure
pub const UNAUTHENTICATED_MESSAGE: &str = "Could not validate credentials";

/// The authenticated caller, placed in request extensions by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Authenticated user id
    pub user_id: Uuid,
}

/// Authentication failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Missing, malformed, forged or expired credentials
    #[error("Could not validate credentials")]
    Unauthenticated,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "error": "unauthorized",
            "message": UNAUTHENTICATED_MESSAGE,
        }));

        let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            header::HeaderValue::from_static("Bearer"),
        );
        response
    }
}

/// Extracts the bearer token from request headers
///
/// The scheme is matched case-insensitively; surrounding whitespace is ignored.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves request headers to the authenticated user at instant `now`
pub fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
    now: DateTime<Utc>,
) -> Result<AuthUser, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::Unauthenticated)?;
    let user_id = tokens
        .validate(token, now)
        .map_err(|_| AuthError::Unauthenticated)?;

    Ok(AuthUser { user_id })
}

/// Axum middleware guarding every route it wraps
///
/// On success inserts [`AuthUser`] into request extensions; handlers extract it
/// with `Extension<AuthUser>`.
pub async fn bearer_auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let auth = authenticate(req.headers(), &tokens, Utc::now())?;

    tracing::Span::current().record("user_id", tracing::field::display(auth.user_id));
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenConfig;
    use chrono::Duration;

    fn tokens() -> TokenService {
        TokenService::new(TokenConfig {
            secret: "test-secret-key-at-least-32-bytes-long".to_string(),
            ttl: Duration::minutes(30),
        })
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&headers_with("abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_authenticate_valid_token() {
        let tokens = tokens();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let issued = tokens.issue(user_id, now).unwrap();

        let auth = authenticate(&headers_with(&format!("Bearer {}", issued.token)), &tokens, now)
            .expect("Should authenticate");
        assert_eq!(auth.user_id, user_id);
    }

    #[test]
    fn test_authenticate_failures_collapse() {
        let tokens = tokens();
        let now = Utc::now();
        let expired = tokens.issue(Uuid::new_v4(), now - Duration::hours(1)).unwrap();

        let cases = [
            HeaderMap::new(),
            headers_with("Basic dXNlcjpwYXNz"),
            headers_with("Bearer garbage"),
            headers_with(&format!("Bearer {}", expired.token)),
        ];

        for headers in cases.iter() {
            assert_eq!(
                authenticate(headers, &tokens, now),
                Err(AuthError::Unauthenticated)
            );
        }
    }

    #[test]
    fn test_auth_error_into_response() {
        let response = AuthError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
