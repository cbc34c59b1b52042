//! SQL compilation
//!
//! Turns a `QuerySpec` plus base filters into parameterized SELECT and COUNT
//! statements. Identifiers come only from the validated `TableDef`; every
//! value is bound through a dialect placeholder.

use super::cursor::Navigation;
use super::error::QueryError;
use super::filter::{Filter, FilterValue};
use super::pagination::Pagination;
use super::spec::{Boundary, QuerySpec};
use super::table::{Column, TableDef};
use super::types::{Operator, Scalar, SortDirection};
use crate::data::error::DataError;
use crate::data::sql::SqlDialect;
use crate::utils::sql::escape_like_pattern;

/// One statement and its bind values, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Scalar>,
}

/// Statements for one list request
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub table: String,
    /// Page fetch; returns up to `limit + 1` rows
    pub select: SqlQuery,
    /// `COUNT(*)` under the same filters, ignoring the page position
    pub count: SqlQuery,
    /// Columns selected by `select`, in order
    pub columns: Vec<Column>,
    /// Whether the statements carry no WHERE predicates at all
    pub unfiltered: bool,
}

/// Collects bind values and hands out dialect placeholders
struct SqlParams<'d> {
    dialect: &'d dyn SqlDialect,
    values: Vec<Scalar>,
}

impl<'d> SqlParams<'d> {
    fn new(dialect: &'d dyn SqlDialect) -> Self {
        Self {
            dialect,
            values: Vec::new(),
        }
    }

    fn bind(&mut self, value: Scalar) -> String {
        self.values.push(value);
        self.dialect.placeholder(self.values.len())
    }
}

/// Compile a spec into SQL
///
/// Base filters come first and are AND-ed with user filters, so user input
/// can only narrow the result set. `columns` lists the fields to fetch; sort
/// columns are added when missing.
pub fn compile(
    table: &TableDef,
    spec: &QuerySpec,
    base_filters: &[Filter],
    columns: &[String],
    dialect: &dyn SqlDialect,
) -> Result<CompiledQuery, QueryError> {
    let mut params = SqlParams::new(dialect);
    let mut predicates: Vec<String> = Vec::new();

    for filter in base_filters {
        let column = table.column(&filter.field).ok_or_else(|| {
            DataError::Compile(format!(
                "base filter references unknown column {}.{}",
                table.name(),
                filter.field
            ))
        })?;
        predicates.push(filter_sql(filter, column, &mut params));
    }
    for filter in &spec.filters {
        let column = column_for(table, &filter.field)?;
        predicates.push(filter_sql(filter, column, &mut params));
    }

    let count_params = params.values.clone();
    let count_where = where_clause(&predicates);
    let unfiltered = predicates.is_empty();

    let mut sort_columns: Vec<(&Column, SortDirection)> = Vec::with_capacity(spec.sorts.len());
    for sort in &spec.sorts {
        sort_columns.push((column_for(table, &sort.field)?, sort.direction));
    }

    let navigation = spec
        .boundary
        .as_ref()
        .map(|b| b.navigation)
        .unwrap_or_default();

    if let Some(boundary) = &spec.boundary {
        predicates.push(keyset_sql(&sort_columns, boundary, &mut params)?);
    }

    let mut selected: Vec<Column> = Vec::with_capacity(columns.len() + sort_columns.len());
    for name in columns {
        let column = column_for(table, name)?;
        if !selected.iter().any(|c| c.name == column.name) {
            selected.push(column.clone());
        }
    }
    for (column, _) in &sort_columns {
        if !selected.iter().any(|c| c.name == column.name) {
            selected.push((*column).clone());
        }
    }

    let order_by = sort_columns
        .iter()
        .map(|(column, direction)| order_term(column, *direction, navigation, dialect))
        .collect::<Vec<_>>()
        .join(", ");

    let fetch = u64::from(spec.pagination.limit()) + 1;
    let limit = match &spec.pagination {
        Pagination::Cursor { .. } => dialect.limit(fetch),
        Pagination::Offset { offset, .. } => dialect.limit_offset(fetch, *offset),
    };

    let select_list = selected
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let select = SqlQuery {
        sql: format!(
            "SELECT {} FROM {}{} ORDER BY {} {}",
            select_list,
            table.name(),
            where_clause(&predicates),
            order_by,
            limit
        ),
        params: params.values,
    };
    let count = SqlQuery {
        sql: format!("SELECT COUNT(*) FROM {}{}", table.name(), count_where),
        params: count_params,
    };

    Ok(CompiledQuery {
        table: table.name().to_string(),
        select,
        count,
        columns: selected,
        unfiltered,
    })
}

fn column_for<'t>(table: &'t TableDef, field: &str) -> Result<&'t Column, QueryError> {
    table.column(field).ok_or_else(|| {
        QueryError::Execution(DataError::Compile(format!(
            "unknown column {}.{}",
            table.name(),
            field
        )))
    })
}

fn where_clause(predicates: &[String]) -> String {
    if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    }
}

fn filter_sql(filter: &Filter, column: &Column, params: &mut SqlParams<'_>) -> String {
    let col = column.name.as_str();
    let one = match &filter.value {
        FilterValue::One(v) => Some(v),
        FilterValue::Many(_) => None,
    };

    match (filter.operator, &filter.value) {
        (Operator::Null, FilterValue::One(Scalar::Boolean(false))) => {
            format!("{} IS NOT NULL", col)
        }
        (Operator::Null, _) => format!("{} IS NULL", col),
        (Operator::Eq, FilterValue::One(Scalar::Null)) => format!("{} IS NULL", col),
        (Operator::Ne, FilterValue::One(Scalar::Null)) => format!("{} IS NOT NULL", col),
        (Operator::In | Operator::Nin, _) => {
            let values = match &filter.value {
                FilterValue::Many(values) => values.clone(),
                FilterValue::One(v) => vec![v.clone()],
            };
            let placeholders = values
                .into_iter()
                .map(|v| params.bind(v))
                .collect::<Vec<_>>()
                .join(", ");
            if filter.operator == Operator::In {
                format!("{} IN ({})", col, placeholders)
            } else if column.nullable {
                format!("({} NOT IN ({}) OR {} IS NULL)", col, placeholders, col)
            } else {
                format!("{} NOT IN ({})", col, placeholders)
            }
        }
        (Operator::Contains | Operator::StartsWith, _) => {
            let text = match one {
                Some(Scalar::Text(s)) => escape_like_pattern(s),
                _ => String::new(),
            };
            let pattern = if filter.operator == Operator::Contains {
                format!("%{}%", text)
            } else {
                format!("{}%", text)
            };
            let p = params.bind(Scalar::Text(pattern));
            params.dialect.like_escaped(col, &p)
        }
        (op, _) => {
            let value = one.cloned().unwrap_or(Scalar::Null);
            let p = params.bind(value);
            match op {
                Operator::Ne if column.nullable => format!("({} <> {} OR {} IS NULL)", col, p, col),
                Operator::Ne => format!("{} <> {}", col, p),
                Operator::Gt => format!("{} > {}", col, p),
                Operator::Gte => format!("{} >= {}", col, p),
                Operator::Lt => format!("{} < {}", col, p),
                Operator::Lte => format!("{} <= {}", col, p),
                _ => format!("{} = {}", col, p),
            }
        }
    }
}

/// ORDER BY term for one key
///
/// NULLs sort last in display order. Backward navigation fetches in reverse,
/// so both the direction and the NULL placement flip.
fn order_term(
    column: &Column,
    direction: SortDirection,
    navigation: Navigation,
    dialect: &dyn SqlDialect,
) -> String {
    let display_desc = direction == SortDirection::Desc;
    let (desc, nulls_last) = match navigation {
        Navigation::After => (display_desc, true),
        Navigation::Before => (!display_desc, false),
    };
    if column.nullable {
        dialect.order_by_with_nulls(&column.name, desc, nulls_last)
    } else {
        format!("{} {}", column.name, if desc { "DESC" } else { "ASC" })
    }
}

/// Lexicographic keyset predicate over all sort keys
///
/// For keys k0..kn with boundary values v0..vn this is
/// `(k0 ⋗ v0) OR (k0 = v0 AND k1 ⋗ v1) OR ...` where `⋗` means "strictly
/// past the boundary" for that key's direction and navigation.
fn keyset_sql(
    sort_columns: &[(&Column, SortDirection)],
    boundary: &Boundary,
    params: &mut SqlParams<'_>,
) -> Result<String, QueryError> {
    if boundary.values.len() != sort_columns.len() {
        return Err(QueryError::InvalidCursor);
    }

    let mut disjuncts: Vec<String> = Vec::with_capacity(sort_columns.len());
    for i in 0..sort_columns.len() {
        let (column, direction) = sort_columns[i];
        let value = &boundary.values[i];
        // NULLs are last in display order: nothing follows them on this key
        if boundary.navigation == Navigation::After && value.is_null() {
            continue;
        }

        // Bind in text order; SQLite placeholders are positional
        let mut terms: Vec<String> = Vec::with_capacity(i + 1);
        for (j, (prev, _)) in sort_columns.iter().enumerate().take(i) {
            terms.push(match &boundary.values[j] {
                Scalar::Null => format!("{} IS NULL", prev.name),
                v => format!("{} = {}", prev.name, params.bind(v.clone())),
            });
        }
        terms.push(past_sql(column, direction, value, boundary.navigation, params));
        disjuncts.push(if terms.len() == 1 {
            terms.remove(0)
        } else {
            format!("({})", terms.join(" AND "))
        });
    }

    if disjuncts.is_empty() {
        return Ok("1 = 0".to_string());
    }
    Ok(format!("({})", disjuncts.join(" OR ")))
}

/// Predicate for "strictly past `value`" on one key
fn past_sql(
    column: &Column,
    direction: SortDirection,
    value: &Scalar,
    navigation: Navigation,
    params: &mut SqlParams<'_>,
) -> String {
    let col = column.name.as_str();
    let op = match (navigation, direction) {
        (Navigation::After, SortDirection::Asc) | (Navigation::Before, SortDirection::Desc) => ">",
        (Navigation::After, SortDirection::Desc) | (Navigation::Before, SortDirection::Asc) => "<",
    };

    match (navigation, value) {
        (Navigation::After, Scalar::Null) => "1 = 0".to_string(),
        (Navigation::After, v) => {
            let p = params.bind(v.clone());
            if column.nullable {
                format!("({} {} {} OR {} IS NULL)", col, op, p, col)
            } else {
                format!("{} {} {}", col, op, p)
            }
        }
        (Navigation::Before, Scalar::Null) => format!("{} IS NOT NULL", col),
        (Navigation::Before, v) => format!("{} {} {}", col, op, params.bind(v.clone())),
    }
}
