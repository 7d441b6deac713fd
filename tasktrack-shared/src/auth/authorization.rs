//! Ownership checks
//!
//! There is a single role: the owner. The guard establishes who the caller is;
//! these helpers re-assert at the data boundary that a loaded resource belongs
//! to that caller. A resource owned by someone else is reported exactly like a
//! resource that does not exist, so ids cannot be probed.
//!
//! # Example
//!
//! ```
//! use tasktrack_shared::auth::authorization::{require_ownership, AuthzError};
//! use tasktrack_shared::auth::guard::AuthUser;
//! use uuid::Uuid;
//!
//! let me = AuthUser { user_id: Uuid::new_v4() };
//! assert!(require_ownership(&me, me.user_id).is_ok());
//! assert_eq!(require_ownership(&me, Uuid::new_v4()), Err(AuthzError::NotFound));
//! ```

use uuid::Uuid;

use super::guard::AuthUser;

/// Error type for ownership checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Resource is absent or belongs to someone else
    #[error("Resource not found")]
    NotFound,
}

/// Checks that the caller owns a resource
pub fn require_ownership(auth: &AuthUser, resource_owner_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != resource_owner_id {
        return Err(AuthzError::NotFound);
    }

    Ok(())
}

/// Keeps only the items owned by `owner_id`
///
/// Applied to query results after the owner-qualified store read, so a store
/// that forgot its owner predicate still cannot leak rows.
pub fn retain_owned<T>(owner_id: Uuid, items: &mut Vec<T>, owner_of: impl Fn(&T) -> Uuid) -> usize {
    let before = items.len();
    items.retain(|item| owner_of(item) == owner_id);
    let dropped = before - items.len();

    if dropped > 0 {
        tracing::error!(
            owner_id = %owner_id,
            dropped,
            "Store returned rows owned by another user; dropped"
        );
    }

    dropped
}
