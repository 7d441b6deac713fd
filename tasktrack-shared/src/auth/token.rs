//! Bearer token issuance and validation
//!
//! Tokens are HS256-signed JWTs binding exactly one user id to an expiry
//! instant. They are stateless: nothing is persisted, a token lives until its
//! `exp` or until the signing secret is rotated (which invalidates every
//! outstanding token at once). Revocation of a single token before expiry is
//! not supported.
//!
//! The signing secret is immutable configuration handed to [`TokenService`] at
//! startup; the service is then shared behind an `Arc`.
//!
//! # Claims
//!
//! - `sub`: user id
//! - `iss`: always [`ISSUER`]
//! - `iat`: issued-at (Unix seconds)
//! - `exp`: expiry (Unix seconds); valid while `now < exp`
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use tasktrack_shared::auth::token::{TokenConfig, TokenService};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tokens = TokenService::new(TokenConfig {
//!     secret: "test-secret-key-at-least-32-bytes-long".to_string(),
//!     ttl: Duration::minutes(30),
//! });
//!
//! let user_id = Uuid::new_v4();
//! let now = Utc::now();
//! let issued = tokens.issue(user_id, now)?;
//!
//! assert_eq!(tokens.validate(&issued.token, now)?, user_id);
//! assert!(tokens.validate(&issued.token, now + Duration::minutes(30)).is_err());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim stamped on and required from every token
pub const ISSUER: &str = "tasktrack";

/// Error type for token operations
///
/// Validation failures deliberately carry no detail: a malformed, forged,
/// foreign-key or expired token all produce the same value and message.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    Issue(String),

    /// Token is not acceptable
    #[error("Invalid or expired token")]
    Invalid,
}

/// Token service configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Shared HMAC secret (at least 32 bytes recommended)
    pub secret: String,

    /// Lifetime of an issued token
    pub ttl: Duration,
}

/// JWT claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    pub sub: Uuid,

    /// Issuer - always "tasktrack"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A freshly issued token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded JWT
    pub token: String,

    /// Instant after which the token no longer validates
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates bearer tokens with one process-wide secret
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Builds the service from its configuration
    pub fn new(config: TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // Expiry is checked against the caller-supplied clock in `validate`.
        validation.validate_exp = false;
        validation.validate_nbf = false;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            ttl: config.ttl,
        }
    }

    /// Configured token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `user_id` that expires at `now + ttl`
    ///
    /// `exp` has whole-second resolution and is rounded up, so the token never
    /// dies before `now + ttl`; the returned `expires_at` is that rounded
    /// instant.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Issue` if encoding fails.
    pub fn issue(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: ceil_seconds(expires_at),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Issue(format!("Token encoding failed: {}", e)))?;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or(expires_at);

        Ok(IssuedToken { token, expires_at })
    }

    /// Validates a token at instant `now` and returns the user id it binds
    ///
    /// Checks, in order: structure, HS256 signature, issuer, `now < exp`.
    ///
    /// # Errors
    ///
    /// Every failure is `TokenError::Invalid`.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!(reason = ?e.kind(), "Rejected bearer token");
            TokenError::Invalid
        })?;

        if now.timestamp() >= data.claims.exp {
            tracing::debug!(reason = "expired", "Rejected bearer token");
            return Err(TokenError::Invalid);
        }

        Ok(data.claims.sub)
    }
}

/// Unix seconds of `instant`, rounded up to the next whole second
fn ceil_seconds(instant: DateTime<Utc>) -> i64 {
    let seconds = instant.timestamp();
    if instant.timestamp_subsec_nanos() > 0 {
        seconds + 1
    } else {
        seconds
    }
}
