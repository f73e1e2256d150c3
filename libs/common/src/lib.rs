//! Common library for the recipe backend
//!
//! This crate provides functionality shared by the `auth` and `api`
//! services: PostgreSQL connectivity and migrations, the database readiness
//! probe, bearer-token handling and the shared error types.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, ReadinessPolicy, health_check, init_pool, wait_for_db};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     if wait_for_db(&config, &ReadinessPolicy::default()).await {
//!         let pool = init_pool(&config).await?;
//!         println!("Database health check: {}", health_check(&pool).await?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod token;
