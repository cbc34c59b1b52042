//! Per-endpoint query configuration
//!
//! An `EndpointQuery` bundles everything a list endpoint needs: its table,
//! filter registry, sort config, pagination limits, field selection and
//! count strategy. All of it is validated once at registration.

use super::cursor::CursorCodec;
use super::error::{QueryError, RegistryError};
use super::executor::{CountStrategy, QueryExecutor};
use super::fields::{FieldSelection, FieldSelectionConfig, parse_fields};
use super::filter::{Filter, FilterRegistry, parse_filters};
use super::page::Page;
use super::pagination::{Pagination, PaginationConfig, resolve_pagination_at};
use super::sort::{SortConfig, parse_sorts};
use super::spec::{Boundary, QueryParams, QuerySpec};
use super::table::TableDef;

#[derive(Debug, Clone)]
pub struct EndpointQuery {
    table: TableDef,
    filters: FilterRegistry,
    sorts: SortConfig,
    pagination: PaginationConfig,
    fields: FieldSelectionConfig,
    codec: CursorCodec,
    count: Option<CountStrategy>,
}

impl EndpointQuery {
    pub fn new(
        table: TableDef,
        filters: FilterRegistry,
        sorts: SortConfig,
        pagination: PaginationConfig,
        fields: FieldSelectionConfig,
        codec: CursorCodec,
    ) -> Result<Self, RegistryError> {
        let tiebreaker = table.require(sorts.tiebreaker())?;
        if tiebreaker.nullable {
            return Err(RegistryError::InvalidSortConfig(format!(
                "tiebreaker {} must be NOT NULL",
                tiebreaker.name
            )));
        }
        Ok(Self {
            table,
            filters,
            sorts,
            pagination,
            fields,
            codec,
            count: None,
        })
    }

    /// Count strategy used for every request on this endpoint
    pub fn with_count(mut self, count: CountStrategy) -> Self {
        self.count = Some(count);
        self
    }

    pub fn table(&self) -> &TableDef {
        &self.table
    }

    pub fn codec(&self) -> &CursorCodec {
        &self.codec
    }

    /// Count strategy for a spec; offset pages always need a total
    pub fn count_for(&self, spec: &QuerySpec) -> Option<CountStrategy> {
        match spec.pagination {
            Pagination::Offset { .. } => Some(self.count.unwrap_or(CountStrategy::Exact)),
            Pagination::Cursor { .. } => self.count,
        }
    }

    pub fn build_spec(&self, params: &QueryParams) -> Result<QuerySpec, QueryError> {
        self.build_spec_at(params, chrono::Utc::now().timestamp())
    }

    /// Validate raw parameters into a spec
    ///
    /// Pure and synchronous; the first error wins. A cursor is bound to the
    /// resolved sort list here, so one minted under another ordering fails.
    pub fn build_spec_at(&self, params: &QueryParams, now: i64) -> Result<QuerySpec, QueryError> {
        let fields = parse_fields(params.fields.as_deref(), &self.fields)?;
        let filters = parse_filters(&params.filters, &self.filters)?;
        let sorts = parse_sorts(params.sort.as_deref(), &self.sorts)?;
        let pagination =
            resolve_pagination_at(&params.pagination, &self.pagination, &self.codec, now)?;

        let boundary = match &pagination {
            Pagination::Cursor {
                cursor: Some(payload),
                ..
            } => Some(Boundary::from_cursor(payload, &sorts)?),
            _ => None,
        };

        Ok(QuerySpec {
            filters,
            sorts,
            pagination,
            fields,
            boundary,
        })
    }

    /// Fields rendered for a selection
    pub fn visible_fields(&self, selection: &FieldSelection) -> Vec<String> {
        self.fields.visible(selection, &self.table)
    }

    /// Validate, execute and assemble one page
    ///
    /// Nothing touches the store unless every parameter is valid.
    pub async fn list(
        &self,
        executor: &QueryExecutor,
        params: &QueryParams,
        base_filters: &[Filter],
    ) -> Result<Page, QueryError> {
        let spec = self.build_spec(params)?;
        let fields = self.visible_fields(&spec.fields);
        let result = executor
            .execute(
                &self.table,
                &spec,
                base_filters,
                &fields,
                self.count_for(&spec),
            )
            .await?;
        Page::assemble(result, &spec, fields, &self.codec)
    }
}
