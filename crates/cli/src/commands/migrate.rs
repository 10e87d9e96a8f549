//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! tabacaria-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! Migrations live in `crates/api/migrations/`:
//! ```text
//! migrations/
//! ├── 20260301000001_create_catalog.sql
//! ├── 20260301000002_create_orders.sql
//! ├── 20260301000003_checkout_procedure.sql
//! └── 20260301000004_insight_functions.sql
//! ```

use super::{CommandError, database_url};

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if the URL is missing, the database is unreachable,
/// or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = tabacaria_api::db::create_pool(&url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
