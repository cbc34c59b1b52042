//! Query executor
//!
//! Compiles a `QuerySpec` with its endpoint's base filters, runs the page
//! fetch and the optional count against a `QueryStore`, and normalizes the
//! fetched rows back into display order.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::cursor::Navigation;
use super::error::QueryError;
use super::filter::Filter;
use super::sql::{CompiledQuery, SqlQuery, compile};
use super::spec::QuerySpec;
use super::table::{Column, TableDef};
use super::types::Scalar;
use crate::data::error::DataError;
use crate::data::sql::SqlDialect;

/// How `total` is computed, if at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountStrategy {
    /// `COUNT(*)` under the same filters
    Exact,
    /// Planner statistics when available, exact otherwise
    Estimated,
}

/// One result row, columns in select order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<(String, Scalar)>,
}

impl Row {
    pub fn new(values: Vec<(String, Scalar)>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&Scalar> {
        self.values.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    /// Render the given fields as a JSON object, in the given order
    pub fn to_json(&self, fields: &[String]) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(fields.len());
        for field in fields {
            let value = self.get(field).map(Scalar::to_json).unwrap_or_default();
            map.insert(field.clone(), value);
        }
        serde_json::Value::Object(map)
    }
}

/// Relational store the executor runs compiled statements against
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// SQL dialect the store speaks
    fn dialect(&self) -> &'static dyn SqlDialect;

    /// Run a SELECT, decoding each row according to `columns`
    async fn fetch(&self, query: &SqlQuery, columns: &[Column]) -> Result<Vec<Row>, DataError>;

    /// Run a `SELECT COUNT(*)` statement
    async fn count(&self, query: &SqlQuery) -> Result<u64, DataError>;

    /// Cheap row-count estimate, or `None` when the store has none
    async fn estimate(&self, query: &CompiledQuery) -> Result<Option<u64>, DataError>;

    /// Round-trip to the store, used by health checks
    async fn ping(&self) -> Result<(), DataError> {
        let probe = SqlQuery {
            sql: "SELECT 1".to_string(),
            params: Vec::new(),
        };
        self.count(&probe).await.map(|_| ())
    }
}

/// Rows of one page plus the facts needed to build its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    /// At most `limit` rows, in display order
    pub rows: Vec<Row>,
    /// Whether another row exists past the page in fetch direction
    pub has_more: bool,
    pub total: Option<u64>,
}

#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn QueryStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn QueryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn QueryStore> {
        &self.store
    }

    /// Execute a validated spec
    ///
    /// Issues exactly one fetch and at most one count (two for an estimate
    /// that falls back). Store failures are not retried.
    pub async fn execute(
        &self,
        table: &TableDef,
        spec: &QuerySpec,
        base_filters: &[Filter],
        columns: &[String],
        count: Option<CountStrategy>,
    ) -> Result<ExecutionResult, QueryError> {
        let compiled = compile(table, spec, base_filters, columns, self.store.dialect())?;
        tracing::trace!(
            table = %compiled.table,
            sql = %compiled.select.sql,
            params = compiled.select.params.len(),
            "Compiled list query"
        );

        let start = Instant::now();
        let fetch = self.store.fetch(&compiled.select, &compiled.columns);
        let total = self.total(&compiled, count);
        let (mut rows, total) = futures::try_join!(fetch, total)?;

        let limit = spec.pagination.limit() as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);

        let navigation = spec.boundary.as_ref().map(|b| b.navigation);
        if navigation == Some(Navigation::Before) {
            rows.reverse();
        }

        tracing::debug!(
            table = %compiled.table,
            rows = rows.len(),
            has_more,
            total = ?total,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Executed list query"
        );

        Ok(ExecutionResult {
            rows,
            has_more,
            total,
        })
    }

    async fn total(
        &self,
        compiled: &CompiledQuery,
        strategy: Option<CountStrategy>,
    ) -> Result<Option<u64>, DataError> {
        match strategy {
            None => Ok(None),
            Some(CountStrategy::Exact) => self.store.count(&compiled.count).await.map(Some),
            Some(CountStrategy::Estimated) => match self.store.estimate(compiled).await? {
                Some(estimate) => Ok(Some(estimate)),
                None => self.store.count(&compiled.count).await.map(Some),
            },
        }
    }
}
