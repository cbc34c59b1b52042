//! Query layer error types

use thiserror::Error;

use super::types::{FieldType, Operator};
use crate::data::error::DataError;

/// Configuration errors detected while registering an endpoint
///
/// These surface at server start-up, never per request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Table {0} declares no columns")]
    EmptyTable(String),

    #[error("Duplicate column {column} on table {table}")]
    DuplicateColumn { table: String, column: String },

    #[error("Field {field} is not a column of {table}")]
    UnknownColumn { table: String, field: String },

    #[error("Field {0} is registered without operators")]
    NoOperators(String),

    #[error("Operator {operator} cannot be used on {ty} field {field}")]
    UnsupportedOperator {
        field: String,
        operator: Operator,
        ty: FieldType,
    },

    #[error("Sort config: {0}")]
    InvalidSortConfig(String),

    #[error("Pagination config: {0}")]
    InvalidPaginationConfig(String),

    #[error("Field selection config: {0}")]
    InvalidFieldSelection(String),
}

/// Errors produced while parsing, validating, or executing a list query
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Malformed filter parameter: {param}")]
    MalformedFilter { param: String },

    #[error("Cannot filter by field: {field}")]
    UnknownFilterField { field: String },

    #[error("Operator {operator} is not allowed for field {field}")]
    OperatorNotAllowed { field: String, operator: String },

    #[error("Invalid value {value:?} for {expected} field {field}")]
    InvalidFilterValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Maximum {max} filters allowed")]
    TooManyFilters { max: usize },

    #[error("Cannot sort by field: {field}")]
    UnknownSortField { field: String },

    #[error("Invalid sort direction {direction:?} for field {field}. Use asc or desc")]
    InvalidSortDirection { field: String, direction: String },

    #[error("Field {field} appears more than once in sort")]
    DuplicateSortField { field: String },

    #[error("Maximum {max} sort fields allowed")]
    TooManySorts { max: usize },

    #[error("Limit must be between 1 and {max}, got {value:?}")]
    InvalidLimit { value: String, max: u32 },

    #[error("Invalid page: {reason}")]
    InvalidPage { reason: String },

    #[error("Cannot select field: {field}")]
    UnknownField { field: String },

    #[error("Field selection is not supported on this endpoint")]
    FieldSelectionDisabled,

    #[error("Invalid cursor. Restart pagination from the first page")]
    InvalidCursor,

    #[error("Cursor expired. Restart pagination from the first page")]
    CursorExpired,

    #[error("Failed to encode cursor: {0}")]
    CursorEncoding(#[from] serde_json::Error),

    #[error("Query execution failed: {0}")]
    Execution(#[from] DataError),
}

impl QueryError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedFilter { .. } => "MALFORMED_FILTER",
            Self::UnknownFilterField { .. } => "UNKNOWN_FILTER_FIELD",
            Self::OperatorNotAllowed { .. } => "OPERATOR_NOT_ALLOWED",
            Self::InvalidFilterValue { .. } => "INVALID_FILTER_VALUE",
            Self::TooManyFilters { .. } => "TOO_MANY_FILTERS",
            Self::UnknownSortField { .. } => "UNKNOWN_SORT_FIELD",
            Self::InvalidSortDirection { .. } => "INVALID_SORT_DIRECTION",
            Self::DuplicateSortField { .. } => "DUPLICATE_SORT_FIELD",
            Self::TooManySorts { .. } => "TOO_MANY_SORTS",
            Self::InvalidLimit { .. } => "INVALID_LIMIT",
            Self::InvalidPage { .. } => "INVALID_PAGE",
            Self::UnknownField { .. } => "UNKNOWN_FIELD",
            Self::FieldSelectionDisabled => "FIELD_SELECTION_DISABLED",
            Self::InvalidCursor => "INVALID_CURSOR",
            Self::CursorExpired => "CURSOR_EXPIRED",
            Self::CursorEncoding(_) => "INTERNAL",
            Self::Execution(_) => "INTERNAL",
        }
    }

    /// Errors caused by caller input (as opposed to server-side failures)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::CursorEncoding(_) | Self::Execution(_))
    }

    /// Errors that require the caller to restart pagination
    pub fn requires_restart(&self) -> bool {
        matches!(self, Self::InvalidCursor | Self::CursorExpired)
    }
}
