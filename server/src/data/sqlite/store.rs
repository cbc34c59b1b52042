//! `QueryStore` implementation for SQLite
//!
//! Binds `Scalar` parameters, decodes rows by declared column type, and
//! bounds every statement with a timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row as _, Sqlite, SqlitePool};

use crate::data::error::DataError;
use crate::data::sql::{SqlDialect, SqliteDialect};
use crate::query::{Column, CompiledQuery, FieldType, QueryStore, Row, Scalar, SqlQuery};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    timeout: Duration,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool, timeout_secs: u64) -> Self {
        Self {
            pool,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, DataError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(DataError::from),
            Err(_) => Err(DataError::timeout("sqlite", self.timeout.as_secs())),
        }
    }

    /// Table row count from `ANALYZE` statistics, if collected
    async fn stat_rows(&self, table: &str) -> Result<Option<u64>, DataError> {
        let has_stats: bool = self
            .bounded(
                sqlx::query_scalar(
                    "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='sqlite_stat1'",
                )
                .fetch_one(&self.pool),
            )
            .await?;
        if !has_stats {
            return Ok(None);
        }

        let stat: Option<String> = self
            .bounded(
                sqlx::query_scalar("SELECT stat FROM sqlite_stat1 WHERE tbl = ? LIMIT 1")
                    .bind(table)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(stat.and_then(|s| s.split_whitespace().next()?.parse().ok()))
    }
}

#[async_trait]
impl QueryStore for SqliteStore {
    fn dialect(&self) -> &'static dyn SqlDialect {
        &SqliteDialect
    }

    async fn fetch(&self, query: &SqlQuery, columns: &[Column]) -> Result<Vec<Row>, DataError> {
        let rows = self
            .bounded(bind_all(sqlx::query(&query.sql), &query.params).fetch_all(&self.pool))
            .await?;
        rows.iter().map(|row| decode_row(row, columns)).collect()
    }

    async fn count(&self, query: &SqlQuery) -> Result<u64, DataError> {
        let row = self
            .bounded(bind_all(sqlx::query(&query.sql), &query.params).fetch_one(&self.pool))
            .await?;
        let count: i64 = row.try_get(0).map_err(DataError::from)?;
        Ok(count.max(0) as u64)
    }

    async fn estimate(&self, query: &CompiledQuery) -> Result<Option<u64>, DataError> {
        // Table statistics say nothing about filtered subsets
        if !query.unfiltered {
            return Ok(None);
        }
        self.stat_rows(&query.table).await
    }
}

fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[Scalar],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in params {
        query = match value {
            Scalar::Null => query.bind(None::<i64>),
            Scalar::Text(s) => query.bind(s.clone()),
            Scalar::Integer(i) => query.bind(*i),
            Scalar::Number(n) => query.bind(*n),
            Scalar::Boolean(b) => query.bind(*b),
            Scalar::Date(dt) => query.bind(dt.timestamp()),
        };
    }
    query
}

fn decode_row(row: &SqliteRow, columns: &[Column]) -> Result<Row, DataError> {
    let mut values = Vec::with_capacity(columns.len());
    for (index, column) in columns.iter().enumerate() {
        values.push((column.name.clone(), decode_value(row, index, column)?));
    }
    Ok(Row::new(values))
}

fn decode_value(row: &SqliteRow, index: usize, column: &Column) -> Result<Scalar, DataError> {
    let err = |e: sqlx::Error| DataError::decode(&column.name, e.to_string());
    let value = match column.ty {
        FieldType::String => row
            .try_get_unchecked::<Option<String>, _>(index)
            .map_err(err)?
            .map(Scalar::Text),
        FieldType::Integer => row
            .try_get_unchecked::<Option<i64>, _>(index)
            .map_err(err)?
            .map(Scalar::Integer),
        FieldType::Number => row
            .try_get_unchecked::<Option<f64>, _>(index)
            .map_err(err)?
            .map(Scalar::Number),
        FieldType::Boolean => row
            .try_get_unchecked::<Option<bool>, _>(index)
            .map_err(err)?
            .map(Scalar::Boolean),
        FieldType::Date => match row
            .try_get_unchecked::<Option<i64>, _>(index)
            .map_err(err)?
        {
            Some(secs) => Some(Scalar::Date(DateTime::from_timestamp(secs, 0).ok_or_else(
                || DataError::decode(&column.name, format!("timestamp {} out of range", secs)),
            )?)),
            None => None,
        },
    };
    Ok(value.unwrap_or(Scalar::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::SqliteService;
    use crate::data::sqlite::catalog::{NewProduct, insert_product};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let service = SqliteService::from_pool(pool).await.unwrap();
        SqliteStore::new(service.pool().clone(), 5)
    }

    fn columns() -> Vec<Column> {
        vec![
            Column {
                name: "id".into(),
                ty: FieldType::Integer,
                nullable: false,
            },
            Column {
                name: "price".into(),
                ty: FieldType::Number,
                nullable: false,
            },
            Column {
                name: "is_active".into(),
                ty: FieldType::Boolean,
                nullable: false,
            },
            Column {
                name: "rating".into(),
                ty: FieldType::Number,
                nullable: true,
            },
            Column {
                name: "created_at".into(),
                ty: FieldType::Date,
                nullable: false,
            },
        ]
    }

    #[tokio::test]
    async fn fetch_decodes_declared_types() {
        let store = setup_store().await;
        let mut product = NewProduct::sample("lamp", 12.5);
        product.rating = None;
        insert_product(&store.pool, &product).await.unwrap();

        let query = SqlQuery {
            sql: "SELECT id, price, is_active, rating, created_at FROM products WHERE price >= ?"
                .into(),
            params: vec![Scalar::Number(10.0)],
        };
        let rows = store.fetch(&query, &columns()).await.unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get("price"), Some(&Scalar::Number(12.5)));
        assert_eq!(row.get("is_active"), Some(&Scalar::Boolean(true)));
        assert_eq!(row.get("rating"), Some(&Scalar::Null));
        assert!(matches!(row.get("created_at"), Some(Scalar::Date(_))));
    }

    #[tokio::test]
    async fn count_binds_params() {
        let store = setup_store().await;
        for price in [1.0, 6.0, 9.0] {
            insert_product(&store.pool, &NewProduct::sample("item", price))
                .await
                .unwrap();
        }
        let query = SqlQuery {
            sql: "SELECT COUNT(*) FROM products WHERE price > ? AND is_active = ?".into(),
            params: vec![Scalar::Number(2.0), Scalar::Boolean(true)],
        };
        assert_eq!(store.count(&query).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn estimate_uses_statistics_when_present() {
        let store = setup_store().await;
        for price in [1.0, 2.0, 3.0] {
            insert_product(&store.pool, &NewProduct::sample("item", price))
                .await
                .unwrap();
        }
        let compiled = CompiledQuery {
            table: "products".into(),
            select: SqlQuery {
                sql: String::new(),
                params: vec![],
            },
            count: SqlQuery {
                sql: "SELECT COUNT(*) FROM products".into(),
                params: vec![],
            },
            columns: vec![],
            unfiltered: true,
        };
        assert_eq!(store.estimate(&compiled).await.unwrap(), None);

        sqlx::query("ANALYZE").execute(&store.pool).await.unwrap();
        assert_eq!(store.estimate(&compiled).await.unwrap(), Some(3));

        let filtered = CompiledQuery {
            unfiltered: false,
            ..compiled
        };
        assert_eq!(store.estimate(&filtered).await.unwrap(), None);
    }

    #[tokio::test]
    async fn sql_errors_surface_as_data_errors() {
        let store = setup_store().await;
        let query = SqlQuery {
            sql: "SELECT nope FROM products".into(),
            params: vec![],
        };
        let err = store.fetch(&query, &columns()).await.unwrap_err();
        assert!(matches!(err, DataError::Sqlite(_)));
    }
}
