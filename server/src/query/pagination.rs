//! Pagination resolver
//!
//! Decides between cursor (keyset) and offset pagination and validates the
//! page size. Limits are never clamped: out-of-range values are errors.

use super::cursor::{CursorCodec, CursorPayload};
use super::error::{QueryError, RegistryError};

/// Per-endpoint pagination limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    default_limit: u32,
    max_limit: u32,
    max_offset: u64,
}

impl PaginationConfig {
    pub fn new(default_limit: u32, max_limit: u32, max_offset: u64) -> Result<Self, RegistryError> {
        if max_limit == 0 {
            return Err(RegistryError::InvalidPaginationConfig(
                "max_limit must be at least 1".to_string(),
            ));
        }
        if default_limit == 0 || default_limit > max_limit {
            return Err(RegistryError::InvalidPaginationConfig(format!(
                "default_limit must be between 1 and {}",
                max_limit
            )));
        }
        Ok(Self {
            default_limit,
            max_limit,
            max_offset,
        })
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    pub fn max_limit(&self) -> u32 {
        self.max_limit
    }

    pub fn max_offset(&self) -> u64 {
        self.max_offset
    }
}

/// Pagination parameters as they arrived in the query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPagination {
    pub cursor: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
    pub offset: Option<String>,
}

/// Resolved pagination mode
#[derive(Debug, Clone, PartialEq)]
pub enum Pagination {
    Cursor {
        limit: u32,
        /// `None` on the first page
        cursor: Option<CursorPayload>,
    },
    Offset {
        limit: u32,
        /// Set when the caller paged by number rather than raw offset
        page: Option<u32>,
        offset: u64,
    },
}

impl Pagination {
    pub fn limit(&self) -> u32 {
        match self {
            Self::Cursor { limit, .. } | Self::Offset { limit, .. } => *limit,
        }
    }

    pub fn is_cursor(&self) -> bool {
        matches!(self, Self::Cursor { .. })
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Cursor { .. } => "cursor",
            Self::Offset { .. } => "offset",
        }
    }
}

/// Resolve pagination parameters using the current time for cursor expiry
pub fn resolve_pagination(
    raw: &RawPagination,
    config: &PaginationConfig,
    codec: &CursorCodec,
) -> Result<Pagination, QueryError> {
    resolve_pagination_at(raw, config, codec, chrono::Utc::now().timestamp())
}

/// Resolve pagination parameters with an explicit clock
///
/// A present cursor always selects cursor mode and wins over `page`/`offset`.
/// A bad cursor is an error, never a silent restart from page one.
pub fn resolve_pagination_at(
    raw: &RawPagination,
    config: &PaginationConfig,
    codec: &CursorCodec,
    now: i64,
) -> Result<Pagination, QueryError> {
    let limit = resolve_limit(raw.limit.as_deref(), config)?;

    if let Some(token) = raw.cursor.as_deref() {
        let payload = codec.decode_at(token, now)?;
        return Ok(Pagination::Cursor {
            limit,
            cursor: Some(payload),
        });
    }

    match (raw.page.as_deref(), raw.offset.as_deref()) {
        (Some(_), Some(_)) => Err(QueryError::InvalidPage {
            reason: "page and offset cannot be combined".to_string(),
        }),
        (Some(page), None) => {
            let page = page
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| QueryError::InvalidPage {
                    reason: format!("page must be a positive integer, got {:?}", page),
                })?;
            let offset = u64::from(page - 1) * u64::from(limit);
            check_offset(offset, config)?;
            Ok(Pagination::Offset {
                limit,
                page: Some(page),
                offset,
            })
        }
        (None, Some(offset)) => {
            let offset = offset
                .trim()
                .parse::<u64>()
                .map_err(|_| QueryError::InvalidPage {
                    reason: format!("offset must be a non-negative integer, got {:?}", offset),
                })?;
            check_offset(offset, config)?;
            Ok(Pagination::Offset {
                limit,
                page: None,
                offset,
            })
        }
        (None, None) => Ok(Pagination::Cursor {
            limit,
            cursor: None,
        }),
    }
}

fn resolve_limit(raw: Option<&str>, config: &PaginationConfig) -> Result<u32, QueryError> {
    let Some(raw) = raw else {
        return Ok(config.default_limit);
    };
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|l| (1..=config.max_limit).contains(l))
        .ok_or_else(|| QueryError::InvalidLimit {
            value: raw.to_string(),
            max: config.max_limit,
        })
}

fn check_offset(offset: u64, config: &PaginationConfig) -> Result<(), QueryError> {
    if offset > config.max_offset {
        return Err(QueryError::InvalidPage {
            reason: format!("offset {} exceeds maximum {}", offset, config.max_offset),
        });
    }
    Ok(())
}
