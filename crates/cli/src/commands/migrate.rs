//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! hostdeck migrate
//! ```
//!
//! # Environment Variables
//!
//! - `HOSTDECK_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migration files live in `crates/api/migrations/` and are embedded at build
//! time.

use tracing::info;

use hostdeck_api::db;

use super::{CommandError, database_url};

/// Run the API database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the database cannot be
/// reached, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
