//! Filter registry and parser
//!
//! Turns bracket-notation parameters (`filter[price][gte]=5`) into typed
//! `Filter` predicates validated against a per-endpoint `FilterRegistry`.

use std::collections::BTreeMap;

use super::error::{QueryError, RegistryError};
use super::table::TableDef;
use super::types::{FieldType, Operator, Scalar, parse_bool};

/// Delimiter for `in` / `nin` list values
const LIST_DELIMITER: char = ',';

/// Maximum items in a single `in` / `nin` list
const MAX_LIST_ITEMS: usize = 100;

/// Allowed operators and type for one filterable field
#[derive(Debug, Clone)]
pub struct FilterRule {
    pub ty: FieldType,
    pub nullable: bool,
    pub operators: Vec<Operator>,
}

/// Field → (type, allowed operators), fixed at endpoint registration
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    rules: BTreeMap<String, FilterRule>,
    max_filters: usize,
}

impl FilterRegistry {
    /// Build a registry, checking every field and operator against the table
    pub fn new(
        table: &TableDef,
        fields: &[(&str, &[Operator])],
        max_filters: usize,
    ) -> Result<Self, RegistryError> {
        let mut rules = BTreeMap::new();
        for (field, operators) in fields {
            let column = table.require(field)?;
            if operators.is_empty() {
                return Err(RegistryError::NoOperators(field.to_string()));
            }
            for op in operators.iter() {
                if !op.supports(column.ty, column.nullable) {
                    return Err(RegistryError::UnsupportedOperator {
                        field: field.to_string(),
                        operator: *op,
                        ty: column.ty,
                    });
                }
            }
            rules.insert(
                field.to_string(),
                FilterRule {
                    ty: column.ty,
                    nullable: column.nullable,
                    operators: operators.to_vec(),
                },
            );
        }
        Ok(Self { rules, max_filters })
    }

    pub fn get(&self, field: &str) -> Option<&FilterRule> {
        self.rules.get(field)
    }

    pub fn max_filters(&self) -> usize {
        self.max_filters
    }
}

/// Filter value: a single scalar or a list for `in` / `nin`
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    One(Scalar),
    Many(Vec<Scalar>),
}

impl FilterValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::One(v) => v.to_json(),
            Self::Many(vs) => serde_json::Value::Array(vs.iter().map(Scalar::to_json).collect()),
        }
    }
}

/// Validated filter predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl Filter {
    /// Equality predicate, used for caller-supplied base filters
    pub fn eq(field: impl Into<String>, value: Scalar) -> Self {
        Self {
            field: field.into(),
            operator: Operator::Eq,
            value: FilterValue::One(value),
        }
    }
}

/// Filter parameter as it arrived in the query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilter {
    pub field: String,
    pub operator: Option<String>,
    pub value: String,
}

/// Split a query key of the form `filter[field]` or `filter[field][op]`
///
/// Returns `Ok(None)` when the key is not a filter parameter at all.
pub fn parse_filter_key(key: &str) -> Result<Option<(String, Option<String>)>, QueryError> {
    let Some(rest) = key.strip_prefix("filter") else {
        return Ok(None);
    };
    if !rest.starts_with('[') {
        return Ok(None);
    }

    let malformed = || QueryError::MalformedFilter {
        param: key.to_string(),
    };

    let mut segments = Vec::new();
    let mut remaining = rest;
    while !remaining.is_empty() {
        let inner = remaining.strip_prefix('[').ok_or_else(malformed)?;
        let end = inner.find(']').ok_or_else(malformed)?;
        let segment = &inner[..end];
        if segment.is_empty() || segment.contains('[') {
            return Err(malformed());
        }
        segments.push(segment.to_string());
        remaining = &inner[end + 1..];
    }

    match segments.len() {
        1 => Ok(Some((segments.remove(0), None))),
        2 => {
            let op = segments.pop();
            Ok(Some((segments.remove(0), op)))
        }
        _ => Err(malformed()),
    }
}

/// Parse raw filter parameters against the registry
///
/// Fails on the first invalid filter. Pure; performs no I/O.
pub fn parse_filters(raw: &[RawFilter], registry: &FilterRegistry) -> Result<Vec<Filter>, QueryError> {
    if raw.len() > registry.max_filters {
        return Err(QueryError::TooManyFilters {
            max: registry.max_filters,
        });
    }

    raw.iter().map(|r| parse_filter(r, registry)).collect()
}

fn parse_filter(raw: &RawFilter, registry: &FilterRegistry) -> Result<Filter, QueryError> {
    let rule = registry
        .get(&raw.field)
        .ok_or_else(|| QueryError::UnknownFilterField {
            field: raw.field.clone(),
        })?;

    let op_name = raw.operator.as_deref().unwrap_or("eq");
    let operator = Operator::parse(op_name)
        .filter(|op| rule.operators.contains(op))
        .ok_or_else(|| QueryError::OperatorNotAllowed {
            field: raw.field.clone(),
            operator: op_name.to_string(),
        })?;

    let invalid = |expected: &str| QueryError::InvalidFilterValue {
        field: raw.field.clone(),
        value: raw.value.clone(),
        expected: expected.to_string(),
    };

    let value = match operator {
        Operator::Null => {
            FilterValue::One(Scalar::Boolean(parse_bool(&raw.value).ok_or_else(|| invalid("boolean"))?))
        }
        op if op.is_list() => {
            let items: Vec<&str> = raw.value.split(LIST_DELIMITER).collect();
            if items.len() > MAX_LIST_ITEMS {
                return Err(invalid(rule.ty.as_str()));
            }
            let values = items
                .into_iter()
                .map(|item| {
                    if item.trim().is_empty() {
                        return None;
                    }
                    rule.ty.coerce(item)
                })
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| invalid(rule.ty.as_str()))?;
            FilterValue::Many(values)
        }
        _ => FilterValue::One(
            rule.ty
                .coerce(&raw.value)
                .ok_or_else(|| invalid(rule.ty.as_str()))?,
        ),
    };

    Ok(Filter {
        field: raw.field.clone(),
        operator,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableDef {
        TableDef::builder("products")
            .column("id", FieldType::Integer)
            .column("name", FieldType::String)
            .column("price", FieldType::Number)
            .column("is_active", FieldType::Boolean)
            .nullable("rating", FieldType::Number)
            .build()
            .unwrap()
    }

    fn registry() -> FilterRegistry {
        FilterRegistry::new(
            &table(),
            &[
                ("price", &[Operator::Gte, Operator::Lte, Operator::Eq]),
                ("name", &[Operator::Eq, Operator::Contains]),
                ("id", &[Operator::In]),
                ("rating", &[Operator::Null, Operator::Gt]),
            ],
            3,
        )
        .unwrap()
    }

    fn raw(field: &str, op: Option<&str>, value: &str) -> RawFilter {
        RawFilter {
            field: field.to_string(),
            operator: op.map(String::from),
            value: value.to_string(),
        }
    }

    #[test]
    fn filter_key_shapes() {
        assert_eq!(
            parse_filter_key("filter[price]").unwrap(),
            Some(("price".to_string(), None))
        );
        assert_eq!(
            parse_filter_key("filter[price][gte]").unwrap(),
            Some(("price".to_string(), Some("gte".to_string())))
        );
        assert_eq!(parse_filter_key("sort").unwrap(), None);
        assert_eq!(parse_filter_key("filters").unwrap(), None);
    }

    #[test]
    fn filter_key_malformed() {
        for key in ["filter[", "filter[]", "filter[a][b][c]", "filter[a]x", "filter[a[b]]"] {
            assert!(
                matches!(parse_filter_key(key), Err(QueryError::MalformedFilter { .. })),
                "{key} should be malformed"
            );
        }
    }

    #[test]
    fn parses_typed_number() {
        let filters = parse_filters(&[raw("price", Some("gte"), "5.99")], &registry()).unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].operator, Operator::Gte);
        assert_eq!(filters[0].value, FilterValue::One(Scalar::Number(5.99)));
    }

    #[test]
    fn missing_operator_means_eq() {
        let filters = parse_filters(&[raw("name", None, "lamp")], &registry()).unwrap();
        assert_eq!(filters[0].operator, Operator::Eq);
    }

    #[test]
    fn unknown_field_rejected() {
        let err = parse_filters(&[raw("unknown_field", None, "x")], &registry()).unwrap_err();
        assert!(matches!(err, QueryError::UnknownFilterField { field } if field == "unknown_field"));
    }

    #[test]
    fn operator_not_allowed() {
        let err = parse_filters(&[raw("price", Some("contains"), "5")], &registry()).unwrap_err();
        assert!(matches!(err, QueryError::OperatorNotAllowed { .. }));

        let err = parse_filters(&[raw("price", Some("between"), "5")], &registry()).unwrap_err();
        assert!(matches!(err, QueryError::OperatorNotAllowed { operator, .. } if operator == "between"));
    }

    #[test]
    fn invalid_value_rejected() {
        let err = parse_filters(&[raw("price", Some("gte"), "cheap")], &registry()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilterValue { expected, .. } if expected == "number"));
    }

    #[test]
    fn in_list_parsed_and_typed() {
        let filters = parse_filters(&[raw("id", Some("in"), "1,2,3")], &registry()).unwrap();
        assert_eq!(
            filters[0].value,
            FilterValue::Many(vec![Scalar::Integer(1), Scalar::Integer(2), Scalar::Integer(3)])
        );

        let err = parse_filters(&[raw("id", Some("in"), "1,,3")], &registry()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilterValue { .. }));

        let err = parse_filters(&[raw("id", Some("in"), "1,x")], &registry()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilterValue { .. }));
    }

    #[test]
    fn null_operator_takes_boolean() {
        let filters = parse_filters(&[raw("rating", Some("null"), "true")], &registry()).unwrap();
        assert_eq!(filters[0].value, FilterValue::One(Scalar::Boolean(true)));

        let err = parse_filters(&[raw("rating", Some("null"), "maybe")], &registry()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidFilterValue { .. }));
    }

    #[test]
    fn too_many_filters() {
        let many = vec![
            raw("price", Some("gte"), "1"),
            raw("price", Some("lte"), "9"),
            raw("name", None, "a"),
            raw("name", Some("contains"), "b"),
        ];
        let err = parse_filters(&many, &registry()).unwrap_err();
        assert!(matches!(err, QueryError::TooManyFilters { max: 3 }));
    }

    #[test]
    fn registry_rejects_unknown_column() {
        let err = FilterRegistry::new(&table(), &[("color", &[Operator::Eq])], 5).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownColumn { .. }));
    }

    #[test]
    fn registry_rejects_incompatible_operators() {
        let err = FilterRegistry::new(&table(), &[("price", &[Operator::Contains])], 5).unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedOperator { .. }));

        let err = FilterRegistry::new(&table(), &[("is_active", &[Operator::Gt])], 5).unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedOperator { .. }));

        let err = FilterRegistry::new(&table(), &[("price", &[Operator::Null])], 5).unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedOperator { .. }));

        let err = FilterRegistry::new(&table(), &[("price", &[])], 5).unwrap_err();
        assert_eq!(err, RegistryError::NoOperators("price".to_string()));
    }
}
