//! CLI argument definitions.
//!
//! Uses clap derive macros for type-safe argument parsing.

use clap::{Parser, Subcommand};

/// Users API - users resource over SeaORM with a pluggable cache
#[derive(Parser, Debug)]
#[command(name = "users-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Run database migrations
    Migrate(MigrateArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Host to bind to (overrides SERVER_HOST)
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on (overrides SERVER_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Do not apply pending migrations on startup
    #[arg(long)]
    pub skip_migrations: bool,
}

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub action: MigrateAction,
}

/// Migration actions
#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset and re-run all migrations
    Fresh,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["users-api", "serve", "--port", "8080", "--skip-migrations"]);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
                assert!(args.skip_migrations);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_migrate_status() {
        let cli = Cli::parse_from(["users-api", "-v", "migrate", "status"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Migrate(MigrateArgs {
                action: MigrateAction::Status
            })
        ));
    }
}
