//! SQL dialect trait for multi-database support
//!
//! The query compiler emits backend-agnostic SQL through this trait, so the
//! same `QuerySpec` can target SQLite (`?`) or PostgreSQL (`$1`).

/// SQL dialect trait for generating database-specific SQL
///
/// Different databases have different syntax for:
/// - Parameter placeholders (? vs $1)
/// - NULL placement in ORDER BY
/// - Case sensitivity of LIKE
pub trait SqlDialect: Send + Sync {
    /// Get the dialect name
    fn name(&self) -> &'static str;

    /// Generate a parameter placeholder for the given index (1-based)
    ///
    /// - SQLite: Always returns "?"
    /// - PostgreSQL: Returns "$1", "$2", etc.
    fn placeholder(&self, index: usize) -> String;

    /// Generate LIMIT clause
    fn limit(&self, limit: u64) -> String {
        format!("LIMIT {}", limit)
    }

    /// Generate LIMIT/OFFSET clause
    fn limit_offset(&self, limit: u64, offset: u64) -> String {
        format!("LIMIT {} OFFSET {}", limit, offset)
    }

    /// Pattern match with backslash as the escape character
    ///
    /// Matching is ASCII case-insensitive on every backend.
    fn like_escaped(&self, col: &str, placeholder: &str) -> String {
        format!("{} LIKE {} ESCAPE '\\'", col, placeholder)
    }

    /// Generate ORDER BY term with NULL handling
    ///
    /// - PostgreSQL: `col DESC NULLS LAST`
    /// - SQLite: Doesn't support NULLS FIRST/LAST, emulated with CASE
    fn order_by_with_nulls(&self, col: &str, desc: bool, nulls_last: bool) -> String;
}
