//! Query specification
//!
//! `QueryParams` collects the raw list-query parameters; `QuerySpec` is the
//! validated, backend-agnostic result handed to the executor.

use serde::Serialize;

use super::cursor::{CursorPayload, Navigation};
use super::error::QueryError;
use super::fields::FieldSelection;
use super::filter::{Filter, RawFilter, parse_filter_key};
use super::pagination::{Pagination, RawPagination};
use super::sort::{Sort, signature};
use super::types::Scalar;

/// Raw list-query parameters split out of the query string
///
/// Scalar parameters take the last occurrence; every `filter[...]` pair is
/// kept. Unrecognized parameters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub filters: Vec<RawFilter>,
    pub sort: Option<String>,
    pub fields: Option<String>,
    pub pagination: RawPagination,
}

impl QueryParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.into();
            match key {
                "sort" => params.sort = Some(value),
                "fields" => params.fields = Some(value),
                "cursor" => params.pagination.cursor = Some(value),
                "limit" => params.pagination.limit = Some(value),
                "page" => params.pagination.page = Some(value),
                "offset" => params.pagination.offset = Some(value),
                _ => {
                    if let Some((field, operator)) = parse_filter_key(key)? {
                        params.filters.push(RawFilter {
                            field,
                            operator,
                            value,
                        });
                    }
                }
            }
        }
        Ok(params)
    }
}

/// Keyset position a page starts from
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    /// One value per sort key, in sort order
    pub values: Vec<Scalar>,
    pub navigation: Navigation,
}

impl Boundary {
    /// Bind a decoded cursor to the current sort list
    ///
    /// The cursor must have been minted under exactly this ordering, else it
    /// is rejected as invalid.
    pub fn from_cursor(payload: &CursorPayload, sorts: &[Sort]) -> Result<Self, QueryError> {
        let position = &payload.position;
        let primary = sorts.first().ok_or(QueryError::InvalidCursor)?;

        if position.order != signature(sorts)
            || position.sort_field != primary.field
            || position.direction != primary.direction
        {
            return Err(QueryError::InvalidCursor);
        }

        let values = if sorts.len() == 1 {
            if !position.keys.is_empty() || position.sort_value != position.tiebreaker_value {
                return Err(QueryError::InvalidCursor);
            }
            vec![position.tiebreaker_value.clone()]
        } else {
            let mut values = Vec::with_capacity(sorts.len());
            values.push(position.sort_value.clone());
            values.extend(position.keys.iter().cloned());
            values.push(position.tiebreaker_value.clone());
            values
        };

        if values.len() != sorts.len() || values.last().is_some_and(Scalar::is_null) {
            return Err(QueryError::InvalidCursor);
        }

        Ok(Self {
            values,
            navigation: position.navigation,
        })
    }
}

/// Validated list query
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub filters: Vec<Filter>,
    pub sorts: Vec<Sort>,
    pub pagination: Pagination,
    pub fields: FieldSelection,
    /// Set in cursor mode when resuming from a cursor
    pub boundary: Option<Boundary>,
}

impl QuerySpec {
    /// Echo of the applied query for response metadata
    pub fn summary(&self) -> QuerySummary {
        QuerySummary {
            filters: self
                .filters
                .iter()
                .map(|f| AppliedFilter {
                    field: f.field.clone(),
                    operator: f.operator.as_str(),
                    value: f.value.to_json(),
                })
                .collect(),
            sort: self.sorts.clone(),
            fields: match &self.fields {
                FieldSelection::All => None,
                FieldSelection::Only(fields) => Some(fields.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedFilter {
    pub field: String,
    pub operator: &'static str,
    pub value: serde_json::Value,
}

/// `meta.query` section of a list response
#[derive(Debug, Clone, Serialize)]
pub struct QuerySummary {
    pub filters: Vec<AppliedFilter>,
    pub sort: Vec<Sort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::cursor::CursorPosition;
    use crate::query::types::SortDirection;

    fn sorts() -> Vec<Sort> {
        vec![
            Sort {
                field: "created_at".into(),
                direction: SortDirection::Desc,
                tiebreaker: false,
            },
            Sort {
                field: "id".into(),
                direction: SortDirection::Desc,
                tiebreaker: true,
            },
        ]
    }

    fn payload(order: &str, field: &str) -> CursorPayload {
        CursorPayload {
            position: CursorPosition {
                sort_field: field.into(),
                sort_value: Scalar::Integer(100),
                keys: vec![],
                tiebreaker_value: Scalar::Integer(9),
                direction: SortDirection::Desc,
                navigation: Navigation::Before,
                order: order.into(),
            },
            issued_at: 0,
            expires_at: 10,
        }
    }

    #[test]
    fn from_pairs_splits_params() {
        let params = QueryParams::from_pairs(vec![
            ("filter[price][gte]", "5.99"),
            ("filter[category]", "books"),
            ("sort", "price:asc"),
            ("limit", "5"),
            ("limit", "2"),
            ("utm_source", "mail"),
            ("filters", "ignored"),
        ])
        .unwrap();

        assert_eq!(params.filters.len(), 2);
        assert_eq!(params.filters[0].operator.as_deref(), Some("gte"));
        assert_eq!(params.filters[1].operator, None);
        assert_eq!(params.sort.as_deref(), Some("price:asc"));
        assert_eq!(params.pagination.limit.as_deref(), Some("2"));
    }

    #[test]
    fn from_pairs_rejects_malformed_filter_keys() {
        let err = QueryParams::from_pairs(vec![("filter[price", "1")]).unwrap_err();
        assert!(matches!(err, QueryError::MalformedFilter { .. }));
    }

    #[test]
    fn boundary_binds_matching_cursor() {
        let boundary =
            Boundary::from_cursor(&payload("created_at:desc,id:desc", "created_at"), &sorts())
                .unwrap();
        assert_eq!(
            boundary.values,
            vec![Scalar::Integer(100), Scalar::Integer(9)]
        );
        assert_eq!(boundary.navigation, Navigation::Before);
    }

    #[test]
    fn boundary_rejects_cursor_from_other_ordering() {
        let err = Boundary::from_cursor(&payload("created_at:asc,id:asc", "created_at"), &sorts())
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidCursor));

        let err = Boundary::from_cursor(&payload("created_at:desc,id:desc", "id"), &sorts())
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidCursor));
    }

    #[test]
    fn boundary_rejects_wrong_key_count() {
        let mut p = payload("created_at:desc,id:desc", "created_at");
        p.position.keys = vec![Scalar::Integer(1)];
        assert!(matches!(
            Boundary::from_cursor(&p, &sorts()),
            Err(QueryError::InvalidCursor)
        ));
    }
}
