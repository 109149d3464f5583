//! Application-wide constants
//!
//! Centralized location for magic values to improve maintainability.

// =============================================================================
// Server Configuration
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 3000;

// =============================================================================
// Database
// =============================================================================

/// Default database provider discriminator
pub const DEFAULT_DB_PROVIDER: &str = "sqlite";

/// Default SQLite database file
pub const DEFAULT_DB_NAME: &str = "app.db";

/// Default Postgres schema search path
pub const DEFAULT_DB_SCHEME: &str = "public";

/// Provider discriminators accepted for the file-backed store
pub const SQLITE_PROVIDERS: &[&str] = &["sqlite", "sqlite+aiosqlite"];

/// Provider discriminators accepted for the networked store
pub const POSTGRES_PROVIDERS: &[&str] = &["postgres", "postgresql", "postgresql+asyncpg"];

// =============================================================================
// Cache
// =============================================================================

/// Default cache backend
pub const DEFAULT_CACHE_BACKEND: &str = "redis";

/// Default Redis URL (for development)
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default cache TTL in seconds (1 hour)
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

/// Shortest TTL accepted by any cache backend (Redis rejects `EX 0`)
pub const MIN_CACHE_TTL_SECONDS: u64 = 1;

/// Maximum number of entries held by the in-process cache
pub const MEMORY_CACHE_MAX_CAPACITY: u64 = 10_000;

/// Cache key holding the full user listing
pub const CACHE_KEY_USERS_ALL: &str = "users:all";

/// Cache key prefix for single users
pub const CACHE_PREFIX_USER: &str = "user:";
