//! Authentication endpoints
//!
//! # Endpoints
//!
//! - `POST /v1/auth/register` - Create an account
//! - `POST /v1/auth/login` - Exchange credentials for a bearer token
//! - `GET /v1/auth/me` - The authenticated user (bearer token required)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasktrack_shared::{
    auth::{guard::AuthUser, password},
    models::user::{NewUser, User},
};
use validator::Validate;

/// Message for every failed login
pub const LOGIN_FAILED_MESSAGE: &str = "Incorrect username or password";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Login name
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (also checked for strength)
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for the `Authorization` header
    pub access_token: String,

    /// Always "bearer"
    pub token_type: String,

    /// Lifetime in seconds
    pub expires_in: i64,

    /// Expiry instant
    pub expires_at: DateTime<Utc>,
}

/// Runs CPU-heavy password work off the async executor
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("Password task failed: {}", e)))
}

/// Register a new user
///
/// ```text
/// POST /v1/auth/register
/// {"username": "alice", "email": "alice@example.com", "password": "Str0ng!pass"}
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: invalid fields or weak password
/// - `409 Conflict`: username or email taken
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    password::validate_password_strength(&req.password)
        .map_err(|message| ApiError::invalid_field("password", message))?;

    let plaintext = req.password;
    let password_hash = blocking(move || password::hash_password(&plaintext)).await??;

    let user = state
        .store
        .insert_user(
            NewUser {
                username: req.username,
                email: req.email,
                password_hash,
            },
            Utc::now(),
        )
        .await?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with username and password
///
/// An unknown username and a wrong password produce the same 401, and both
/// paths run one full password verification.
///
/// # Errors
///
/// - `401 Unauthorized`: bad credentials
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state.store.find_user_by_username(&req.username).await?;

    let digest = user
        .as_ref()
        .map(|u| u.password_hash.clone())
        .unwrap_or_else(|| password::DECOY_HASH.to_string());
    let plaintext = req.password;
    let verified = blocking(move || password::verify_password(&plaintext, &digest)).await?;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::info!("Login failed");
            return Err(ApiError::Unauthorized(LOGIN_FAILED_MESSAGE.to_string()));
        }
    };

    let issued = state.tokens.issue(user.id, Utc::now())?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(TokenResponse {
        access_token: issued.token,
        token_type: "bearer".to_string(),
        expires_in: state.tokens.ttl().num_seconds(),
        expires_at: issued.expires_at,
    }))
}

/// Current user
///
/// # Errors
///
/// - `401 Unauthorized`: the token's user no longer exists
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<User>> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized(tasktrack_shared::auth::guard::UNAUTHENTICATED_MESSAGE.to_string())
        })?;

    Ok(Json(user))
}
