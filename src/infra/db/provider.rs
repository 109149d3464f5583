//! Database provider selection.
//!
//! Turns the raw `db.*` settings into validated engine options. Nothing here
//! touches the network, so a bad provider is rejected before any connection
//! attempt is made.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use sea_orm::ConnectOptions;

use crate::config::{DatabaseSettings, POSTGRES_PROVIDERS, SQLITE_PROVIDERS};
use crate::errors::{AppError, AppResult};

/// Supported relational backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// File-backed SQLite store
    Sqlite,
    /// Networked PostgreSQL store
    Postgres,
}

impl DatabaseProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseProvider::Sqlite => "sqlite",
            DatabaseProvider::Postgres => "postgres",
        }
    }
}

impl FromStr for DatabaseProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if SQLITE_PROVIDERS.contains(&normalized.as_str()) {
            Ok(DatabaseProvider::Sqlite)
        } else if POSTGRES_PROVIDERS.contains(&normalized.as_str()) {
            Ok(DatabaseProvider::Postgres)
        } else {
            Err(AppError::config(format!("unsupported database provider: {:?}", s)))
        }
    }
}

impl fmt::Display for DatabaseProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated engine construction parameters.
#[derive(Clone)]
pub struct EngineOptions {
    pub provider: DatabaseProvider,
    pub url: String,
    /// Postgres `search_path`; always `None` for SQLite
    pub search_path: Option<String>,
    /// Log every SQL statement
    pub echo: bool,
    pub max_connections: Option<u32>,
}

impl fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineOptions")
            .field("provider", &self.provider)
            .field("url", &"[REDACTED]")
            .field("search_path", &self.search_path)
            .field("echo", &self.echo)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl EngineOptions {
    /// Validate settings and build options for the selected provider.
    pub fn from_settings(settings: &DatabaseSettings, debug: bool) -> AppResult<Self> {
        let provider: DatabaseProvider = settings.provider.parse()?;

        let (url, search_path) = match provider {
            DatabaseProvider::Sqlite => {
                if settings.name.trim().is_empty() {
                    return Err(AppError::config("db.name must be set for the sqlite provider"));
                }
                (sqlite_url(&settings.name), None)
            }
            DatabaseProvider::Postgres => {
                let dsn = settings
                    .dsn
                    .as_deref()
                    .filter(|dsn| !dsn.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::config("db.dsn must be set for the postgres provider")
                    })?;
                (dsn.to_string(), Some(settings.scheme.clone()))
            }
        };

        Ok(Self {
            provider,
            url,
            search_path,
            echo: debug,
            max_connections: settings.max_connections,
        })
    }

    /// Driver-level connect options.
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.url.clone());
        options
            .sqlx_logging(self.echo)
            .connect_timeout(Duration::from_secs(10));

        if let Some(search_path) = &self.search_path {
            options.set_schema_search_path(search_path.clone());
        }
        if let Some(max) = self.max_connections {
            options.max_connections(max);
        }

        options
    }
}

fn sqlite_url(name: &str) -> String {
    if name == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{}?mode=rwc", name)
    }
}
