//! Store errors seen by the query layer
//!
//! `QueryStore` implementations report every failure as a `DataError`. The
//! HTTP layer logs these and answers with a generic message; their text is
//! never sent to clients.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// Stored value does not match the declared column type
    #[error("Cannot decode column {column}: {reason}")]
    Decode { column: String, reason: String },

    /// A validated spec referenced something the table does not have
    #[error("Cannot compile query: {0}")]
    Compile(String),

    #[error("Query timeout after {timeout_secs}s on {backend}")]
    Timeout {
        backend: &'static str,
        timeout_secs: u64,
    },
}

impl DataError {
    pub fn decode(column: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    pub fn timeout(backend: &'static str, timeout_secs: u64) -> Self {
        Self::Timeout {
            backend,
            timeout_secs,
        }
    }

    /// Store is overloaded or going away; a retry may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Sqlite(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            ),
            Self::Decode { .. } | Self::Compile(_) => false,
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Timeout { backend, .. } => backend,
            Self::Decode { .. } | Self::Compile(_) => "query",
        }
    }
}
