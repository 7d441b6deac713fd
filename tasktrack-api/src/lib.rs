//! # Tasktrack API Server Library
//!
//! HTTP surface of the task tracker: configuration, router, error mapping and
//! route handlers. Domain logic lives in `tasktrack-shared`.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from environment variables
//! - `error`: error handling and HTTP response mapping
//! - `extract`: request extractors with JSON error bodies
//! - `middleware`: security headers
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
