//! SQL abstraction layer for multi-database support
//!
//! Dialects used by the query compiler to render placeholders, limits and
//! NULL-aware ordering for each backend.

mod dialect;
mod postgres_dialect;
mod sqlite_dialect;

pub use dialect::SqlDialect;
pub use postgres_dialect::PostgresDialect;
pub use sqlite_dialect::SqliteDialect;
