//! Database operations for the API `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `hosting_plan`, `plan_spec` - Plan catalog, written by `hostdeck seed`
//! - `account` - Local accounts resolved from bearer tokens
//! - `customer_order`, `order_item`, `payment` - Checkout aggregate
//! - `project`, `page`, `block` - Site-builder content
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p hostdeck-cli -- migrate
//! ```

pub mod accounts;
pub mod blocks;
pub mod orders;
pub mod ownership;
pub mod pages;
pub mod plans;
pub mod projects;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::AccountRepository;
pub use blocks::BlockRepository;
pub use orders::OrderRepository;
pub use ownership::{AccessError, OwnedResource, ensure_owned};
pub use pages::PageRepository;
pub use plans::PlanRepository;
pub use projects::ProjectRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug within a project).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to [`RepositoryError::Conflict`].
    pub(crate) fn conflict_or(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
