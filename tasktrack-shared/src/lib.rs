//! # Tasktrack Shared Library
//!
//! Domain types, persistence and business rules for the task tracker, used by
//! the API server.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, bearer tokens, the request guard, ownership
//! - `db`: connection pool and migrations
//! - `models`: users, projects, tasks and their SQL
//! - `query`: task filter parsing, SQL compilation and in-memory evaluation
//! - `store`: owner-scoped persistence trait with Postgres and memory backends
//! - `tasks`: task operations on behalf of an authenticated user

pub mod auth;
pub mod db;
pub mod models;
pub mod query;
pub mod store;
pub mod tasks;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
