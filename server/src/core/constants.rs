// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Storefront";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "storefront.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "STOREFRONT_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "STOREFRONT_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "STOREFRONT_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "STOREFRONT_LOG";

/// Environment variable selecting the log format (`json` or `compact`)
pub const ENV_LOG_FORMAT: &str = "STOREFRONT_LOG_FORMAT";

/// Environment variable for the SQLite database path
pub const ENV_DATABASE: &str = "STOREFRONT_DATABASE";

/// Environment variable for cursor lifetime in seconds
pub const ENV_CURSOR_TTL: &str = "STOREFRONT_CURSOR_TTL";

/// Environment variable for the hex-encoded cursor signing secret
pub const ENV_CURSOR_SECRET: &str = "STOREFRONT_CURSOR_SECRET";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5390;

/// Default log filter when neither STOREFRONT_LOG nor RUST_LOG is set
pub const DEFAULT_LOG_FILTER: &str = "info,storefront_server=info,sqlx=warn";

/// Grace period for in-flight work on shutdown
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// SQLite Database
// =============================================================================

/// Default SQLite database path
pub const DEFAULT_DATABASE_PATH: &str = "data/storefront.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite cache size (negative = KB, so -64000 = 64MB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";

/// SQLite WAL auto-checkpoint threshold (pages, ~4MB at 1000)
pub const SQLITE_WAL_AUTOCHECKPOINT: &str = "1000";

/// WAL checkpoint interval in seconds (5 minutes)
pub const SQLITE_CHECKPOINT_INTERVAL_SECS: u64 = 300;

// =============================================================================
// List Queries
// =============================================================================

/// Page size when `limit` is absent
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest accepted `limit`
pub const MAX_LIMIT: u32 = 100;

/// Maximum filters per request
pub const MAX_FILTERS: usize = 10;

/// Maximum requested sort keys (the tiebreaker is not counted)
pub const MAX_SORTS: usize = 3;

/// Deepest accepted OFFSET
pub const MAX_OFFSET: u64 = 10_000;

/// Cursor lifetime in seconds
pub const DEFAULT_CURSOR_TTL_SECS: u64 = 3600;

/// Minimum cursor signing secret length in bytes
pub const CURSOR_SECRET_MIN_LEN: usize = 32;

/// Per-statement timeout for list queries
pub const QUERY_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Request Headers
// =============================================================================

/// Header carrying the authenticated viewer id, set by the gateway
pub const HEADER_USER_ID: &str = "x-user-id";

/// Maximum viewer id length
pub const USER_ID_MAX_LEN: usize = 64;
