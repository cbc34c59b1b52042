//! Data storage layer
//!
//! - `sqlite` - Storefront database: pool, schema, migrations and the
//!   `QueryStore` used by list endpoints
//! - `sql` - SQL dialects for backend-agnostic query compilation
//! - `error` - Unified error type for all backends

pub mod error;
pub mod sql;
pub mod sqlite;

pub use error::DataError;
pub use sqlite::{SqliteService, SqliteStore};
