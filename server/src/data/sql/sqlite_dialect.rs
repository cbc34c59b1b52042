//! SQLite SQL dialect implementation

use super::SqlDialect;

/// SQLite SQL dialect
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn order_by_with_nulls(&self, col: &str, desc: bool, nulls_last: bool) -> String {
        let dir = if desc { "DESC" } else { "ASC" };
        let (null_rank, value_rank) = if nulls_last { (1, 0) } else { (0, 1) };
        format!(
            "CASE WHEN {} IS NULL THEN {} ELSE {} END, {} {}",
            col, null_rank, value_rank, col, dir
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let dialect = SqliteDialect;
        assert_eq!(dialect.placeholder(1), "?");
        assert_eq!(dialect.placeholder(5), "?");
    }

    #[test]
    fn test_like_escaped() {
        let dialect = SqliteDialect;
        assert_eq!(
            dialect.like_escaped("name", "?"),
            "name LIKE ? ESCAPE '\\'"
        );
    }

    #[test]
    fn test_order_by_with_nulls() {
        let dialect = SqliteDialect;
        assert_eq!(
            dialect.order_by_with_nulls("rating", true, true),
            "CASE WHEN rating IS NULL THEN 1 ELSE 0 END, rating DESC"
        );
        assert_eq!(
            dialect.order_by_with_nulls("rating", false, false),
            "CASE WHEN rating IS NULL THEN 0 ELSE 1 END, rating ASC"
        );
    }
}
