//! List-query layer
//!
//! Parses filter, sort, pagination and field-selection parameters into a
//! validated `QuerySpec`, executes it with mandatory base filters, and
//! returns pages with signed continuation cursors.

mod cursor;
mod endpoint;
mod error;
mod executor;
mod fields;
mod filter;
mod page;
mod pagination;
mod sort;
mod spec;
mod sql;
mod table;
mod types;

pub use cursor::{CursorCodec, CursorPayload, CursorPosition, Navigation};
pub use endpoint::EndpointQuery;
pub use error::{QueryError, RegistryError};
pub use executor::{CountStrategy, ExecutionResult, QueryExecutor, QueryStore, Row};
pub use fields::{FieldSelection, FieldSelectionConfig, parse_fields};
pub use filter::{Filter, FilterRegistry, FilterValue, RawFilter, parse_filters};
pub use page::{Page, PaginationMeta};
pub use pagination::{
    Pagination, PaginationConfig, RawPagination, resolve_pagination, resolve_pagination_at,
};
pub use sort::{Sort, SortConfig, parse_sorts};
pub use spec::{Boundary, QueryParams, QuerySpec, QuerySummary};
pub use sql::{CompiledQuery, SqlQuery, compile};
pub use table::{Column, TableDef};
pub use types::{FieldType, Operator, Scalar, SortDirection};
