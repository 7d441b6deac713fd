//! Database layer
//!
//! # Modules
//!
//! - `pool`: PostgreSQL connection pool with a bounded acquire timeout
//! - `migrations`: embedded schema migrations
//!
//! Models (and their SQL) live in the crate-level `models` module.
//!
//! # Example
//!
//! ```no_run
//! use tasktrack_shared::db::migrations::run_migrations;
//! use tasktrack_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig {
//!         url: std::env::var("DATABASE_URL")?,
//!         ..Default::default()
//!     };
//!
//!     let pool = create_pool(config).await?;
//!     run_migrations(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod migrations;
pub mod pool;
