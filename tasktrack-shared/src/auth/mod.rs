//! Authentication and authorization
//!
//! # Modules
//!
//! - [`password`]: Argon2id password hashing and verification
//! - [`token`]: HS256 bearer token issuance and validation
//! - [`guard`]: resolves a request's bearer token to the calling user
//! - [`authorization`]: owner-only access checks
//!
//! # Example
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use tasktrack_shared::auth::password::{hash_password, verify_password};
//! use tasktrack_shared::auth::token::{TokenConfig, TokenService};
//! use uuid::Uuid;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("user_password")?;
//! assert!(verify_password("user_password", &hash));
//!
//! let tokens = TokenService::new(TokenConfig {
//!     secret: "secret-key-at-least-32-bytes-long!!".to_string(),
//!     ttl: Duration::minutes(30),
//! });
//! let issued = tokens.issue(Uuid::new_v4(), Utc::now())?;
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod guard;
pub mod password;
pub mod token;
