use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::crypto::{decode_signing_secret, generate_signing_key};

use super::cli::CliConfig;
use super::constants::{
    CONFIG_FILE_NAME, DEFAULT_CURSOR_TTL_SECS, DEFAULT_DATABASE_PATH, DEFAULT_HOST, DEFAULT_LIMIT,
    DEFAULT_PORT, ENV_CURSOR_SECRET, MAX_FILTERS, MAX_LIMIT, MAX_OFFSET, MAX_SORTS,
    QUERY_TIMEOUT_SECS,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Database configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub path: Option<PathBuf>,
}

/// List query limits section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueryFileConfig {
    pub default_limit: Option<u32>,
    pub max_limit: Option<u32>,
    pub max_filters: Option<usize>,
    pub max_sorts: Option<usize>,
    pub max_offset: Option<u64>,
    pub cursor_ttl_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub query: Option<QueryFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Names of top-level keys this version does not understand
    fn unknown_fields(&self) -> Vec<String> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        let keys = self.unknown_fields();
        if !keys.is_empty() {
            tracing::warn!(
                fields = %keys.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Limits applied to every list endpoint
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub default_limit: u32,
    pub max_limit: u32,
    pub max_filters: usize,
    pub max_sorts: usize,
    pub max_offset: u64,
    pub cursor_ttl_secs: u64,
    pub timeout_secs: u64,
}

/// HMAC key for pagination cursors
#[derive(Clone)]
pub struct CursorSecret {
    key: Vec<u8>,
    generated: bool,
}

impl CursorSecret {
    /// Decode a configured hex secret, or generate an ephemeral one
    pub fn resolve(hex_secret: Option<&str>) -> Result<Self> {
        match hex_secret.map(str::trim).filter(|s| !s.is_empty()) {
            Some(hex) => Ok(Self {
                key: decode_signing_secret(hex)
                    .with_context(|| format!("Invalid {}", ENV_CURSOR_SECRET))?,
                generated: false,
            }),
            None => Ok(Self {
                key: generate_signing_key(),
                generated: true,
            }),
        }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// True when no secret was configured and cursors die with the process
    pub fn is_generated(&self) -> bool {
        self.generated
    }
}

impl fmt::Debug for CursorSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorSecret")
            .field("key", &"[redacted]")
            .field("generated", &self.generated)
            .finish()
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub query: QueryConfig,
    pub cursor_secret: CursorSecret,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Local directory config OR CLI-specified config path
    /// 3. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let config_path = match cli.config {
            Some(ref path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => {
                let local = PathBuf::from(CONFIG_FILE_NAME);
                local.exists().then_some(local)
            }
        };

        let file_config = match config_path {
            Some(path) => {
                let config = FileConfig::load_from_file(&path)?;
                config.warn_unknown_fields();
                config
            }
            None => FileConfig::default(),
        };

        let secret = std::env::var(ENV_CURSOR_SECRET).ok();
        let config = Self::layer(cli, file_config, CursorSecret::resolve(secret.as_deref())?);
        config.validate()?;

        if config.cursor_secret.is_generated() {
            tracing::warn!(
                "{} not set, using a per-process key; cursors will not survive a restart",
                ENV_CURSOR_SECRET
            );
        }

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            database = %config.database.path.display(),
            default_limit = config.query.default_limit,
            max_limit = config.query.max_limit,
            cursor_ttl_secs = config.query.cursor_ttl_secs,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn layer(cli: &CliConfig, file_config: FileConfig, cursor_secret: CursorSecret) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();
        let file_query = file_config.query.unwrap_or_default();

        let host = cli
            .host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT);

        let path = cli
            .database
            .clone()
            .or(file_database.path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let query = QueryConfig {
            default_limit: file_query.default_limit.unwrap_or(DEFAULT_LIMIT),
            max_limit: file_query.max_limit.unwrap_or(MAX_LIMIT),
            max_filters: file_query.max_filters.unwrap_or(MAX_FILTERS),
            max_sorts: file_query.max_sorts.unwrap_or(MAX_SORTS),
            max_offset: file_query.max_offset.unwrap_or(MAX_OFFSET),
            cursor_ttl_secs: cli
                .cursor_ttl
                .or(file_query.cursor_ttl_secs)
                .unwrap_or(DEFAULT_CURSOR_TTL_SECS),
            timeout_secs: file_query.timeout_secs.unwrap_or(QUERY_TIMEOUT_SECS),
        };

        Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig { path },
            query,
            cursor_secret,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        if self.database.path.as_os_str().is_empty() {
            anyhow::bail!("Configuration error: database.path must not be empty");
        }

        let query = &self.query;
        if query.max_limit == 0 || query.default_limit == 0 {
            anyhow::bail!("Configuration error: query limits must be greater than 0");
        }
        if query.default_limit > query.max_limit {
            anyhow::bail!(
                "Configuration error: query.default_limit ({}) exceeds query.max_limit ({})",
                query.default_limit,
                query.max_limit
            );
        }
        if query.max_filters == 0 || query.max_sorts == 0 {
            anyhow::bail!(
                "Configuration error: query.max_filters and query.max_sorts must be greater than 0"
            );
        }
        if query.timeout_secs == 0 {
            anyhow::bail!("Configuration error: query.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
