//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! solid-ops migrate
//! ```
//!
//! Migrations live in `crates/ops/migrations/` and are embedded into the
//! binary at build time.

use sqlx::PgPool;
use tracing::info;

use super::CommandError;

/// Apply every pending migration of the `ops` schema.
///
/// # Errors
///
/// Returns `CommandError::Migration` if a migration fails.
pub async fn run(pool: &PgPool) -> Result<(), CommandError> {
    info!("Running ops migrations...");
    solid_ops::MIGRATOR.run(pool).await?;
    info!("Ops migrations complete");
    Ok(())
}
