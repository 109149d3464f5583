//! Migrate command - Database migration management.

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Settings;
use crate::errors::AppResult;
use crate::infra::Engine;

/// Execute the migrate command
pub async fn execute(args: MigrateArgs, settings: Settings) -> AppResult<()> {
    tracing::info!("Running migration command...");

    let engine = Engine::connect(&settings.db, settings.debug).await?;

    match args.action {
        MigrateAction::Up => {
            tracing::info!("Running pending migrations...");
            engine.run_migrations().await?;
            tracing::info!("Migrations completed successfully");
        }
        MigrateAction::Down => {
            tracing::info!("Rolling back last migration...");
            engine.rollback_migration().await?;
            tracing::info!("Rollback completed successfully");
        }
        MigrateAction::Status => {
            let status = engine.migration_status().await?;
            for (name, applied) in status {
                let status_str = if applied { "applied" } else { "pending" };
                println!("{}: {}", name, status_str);
            }
        }
        MigrateAction::Fresh => {
            tracing::warn!("Resetting database and running all migrations...");
            engine.fresh_migrations().await?;
            tracing::info!("Fresh migrations completed successfully");
        }
    }

    Ok(())
}
