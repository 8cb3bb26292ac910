//! Database migration command.
//!
//! Runs the embedded sourcing migrations against `DATABASE_URL`.

use clementine_sourcing::db::MIGRATOR;

use super::{CliError, Context};

/// Run all pending migrations.
pub async fn run() -> Result<(), CliError> {
    let ctx = Context::connect().await?;

    tracing::info!("Running sourcing migrations...");
    MIGRATOR.run(ctx.store.pool()).await?;
    tracing::info!("Migrations complete");

    Ok(())
}
