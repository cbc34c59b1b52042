//! Page assembly
//!
//! Builds pagination metadata and continuation cursors from an execution
//! result. Cursors are minted from the boundary rows of the page.

use serde::Serialize;
use utoipa::ToSchema;

use super::cursor::{CursorCodec, CursorPosition, Navigation};
use super::error::QueryError;
use super::executor::{ExecutionResult, Row};
use super::pagination::Pagination;
use super::sort::{Sort, signature};
use super::spec::{QuerySpec, QuerySummary};
use super::types::Scalar;

/// `meta.pagination` section of a list response
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// `cursor` or `offset`
    pub mode: String,
    pub has_more: bool,
    pub limit: u32,
    /// Rows on this page
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_cursor: Option<String>,
    /// Present only when a count strategy ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

/// One page of results ready for rendering
#[derive(Debug, Clone)]
pub struct Page {
    pub rows: Vec<Row>,
    /// Fields rendered per row, in order
    pub fields: Vec<String>,
    pub meta: PaginationMeta,
    pub query: QuerySummary,
}

impl Page {
    pub fn assemble(
        result: ExecutionResult,
        spec: &QuerySpec,
        fields: Vec<String>,
        codec: &CursorCodec,
    ) -> Result<Self, QueryError> {
        Self::assemble_at(result, spec, fields, codec, chrono::Utc::now().timestamp())
    }

    /// Assemble with an explicit clock for the minted cursors
    ///
    /// Forward pages (and the first page) get `next_cursor` when more rows
    /// follow and `prev_cursor` when they resumed from a cursor. Backward
    /// pages mirror that: `prev_cursor` when more rows precede, and always a
    /// `next_cursor` back toward where the caller came from.
    pub fn assemble_at(
        result: ExecutionResult,
        spec: &QuerySpec,
        fields: Vec<String>,
        codec: &CursorCodec,
        now: i64,
    ) -> Result<Self, QueryError> {
        let ExecutionResult {
            rows,
            has_more,
            total,
        } = result;

        let meta = match &spec.pagination {
            Pagination::Offset {
                limit,
                page,
                offset,
            } => PaginationMeta {
                mode: spec.pagination.mode().to_string(),
                has_more,
                limit: *limit,
                count: rows.len(),
                next_cursor: None,
                prev_cursor: None,
                total,
                page: *page,
                offset: Some(*offset),
            },
            Pagination::Cursor { limit, .. } => {
                let navigation = spec.boundary.as_ref().map(|b| b.navigation);
                let resumed = navigation.is_some();
                let (want_next, want_prev) = match navigation {
                    Some(Navigation::Before) => (!rows.is_empty(), has_more),
                    _ => (has_more, resumed && !rows.is_empty()),
                };

                let mint = |row: Option<&Row>, nav: Navigation| -> Result<Option<String>, QueryError> {
                    match row {
                        Some(row) => codec
                            .encode_at(position_for(row, &spec.sorts, nav), now)
                            .map(Some),
                        None => Ok(None),
                    }
                };
                let next_cursor = if want_next {
                    mint(rows.last(), Navigation::After)?
                } else {
                    None
                };
                let prev_cursor = if want_prev {
                    mint(rows.first(), Navigation::Before)?
                } else {
                    None
                };

                PaginationMeta {
                    mode: spec.pagination.mode().to_string(),
                    has_more: next_cursor.is_some(),
                    limit: *limit,
                    count: rows.len(),
                    next_cursor,
                    prev_cursor,
                    total,
                    page: None,
                    offset: None,
                }
            }
        };

        Ok(Self {
            rows,
            fields,
            meta,
            query: spec.summary(),
        })
    }

    /// Rows projected onto the selected fields
    pub fn data(&self) -> Vec<serde_json::Value> {
        self.rows.iter().map(|r| r.to_json(&self.fields)).collect()
    }
}

/// Cursor position of a boundary row under the given ordering
fn position_for(row: &Row, sorts: &[Sort], navigation: Navigation) -> CursorPosition {
    let mut values: Vec<Scalar> = sorts
        .iter()
        .map(|s| row.get(&s.field).cloned().unwrap_or(Scalar::Null))
        .collect();

    let tiebreaker_value = values.pop().unwrap_or(Scalar::Null);
    let (sort_value, keys) = if values.is_empty() {
        (tiebreaker_value.clone(), Vec::new())
    } else {
        let keys = values.split_off(1);
        (values.remove(0), keys)
    };

    let primary = sorts.first();
    CursorPosition {
        sort_field: primary.map(|s| s.field.clone()).unwrap_or_default(),
        sort_value,
        keys,
        tiebreaker_value,
        direction: primary.map(|s| s.direction).unwrap_or_default(),
        navigation,
        order: signature(sorts),
    }
}
