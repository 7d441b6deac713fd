//! Middleware modules for the API server
//!
//! Bearer authentication lives in the shared crate
//! (`tasktrack_shared::auth::guard`); this module holds HTTP-only concerns.
//!
//! - `security`: OWASP response headers

pub mod security;
