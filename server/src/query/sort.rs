//! Sort configuration and parser
//!
//! Parses `sort=field:dir,field2:dir2` into an ordered list of sort keys and
//! guarantees a total order by appending the configured tiebreaker.

use serde::Serialize;

use super::error::{QueryError, RegistryError};
use super::table::TableDef;
use super::types::SortDirection;

/// One ORDER BY key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
    pub tiebreaker: bool,
}

/// Per-endpoint sort settings
#[derive(Debug, Clone)]
pub struct SortConfig {
    allowed: Vec<String>,
    defaults: Vec<(String, SortDirection)>,
    tiebreaker: String,
    max_sorts: usize,
}

impl SortConfig {
    /// Build a sort config, validating every name against the table
    ///
    /// The tiebreaker should be a unique, non-null column (typically the
    /// primary key). It may always be requested explicitly.
    pub fn new(
        table: &TableDef,
        allowed: &[&str],
        defaults: &[(&str, SortDirection)],
        tiebreaker: &str,
        max_sorts: usize,
    ) -> Result<Self, RegistryError> {
        if max_sorts == 0 {
            return Err(RegistryError::InvalidSortConfig(
                "max_sorts must be at least 1".to_string(),
            ));
        }
        table.require(tiebreaker)?;
        for field in allowed {
            table.require(field)?;
        }

        let is_allowed = |f: &str| f == tiebreaker || allowed.contains(&f);
        for (i, (field, _)) in defaults.iter().enumerate() {
            if !is_allowed(field) {
                return Err(RegistryError::InvalidSortConfig(format!(
                    "default sort field {} is not in the allow-list",
                    field
                )));
            }
            if defaults[..i].iter().any(|(f, _)| f == field) {
                return Err(RegistryError::InvalidSortConfig(format!(
                    "default sort field {} repeated",
                    field
                )));
            }
        }

        Ok(Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
            defaults: defaults
                .iter()
                .map(|(f, d)| (f.to_string(), *d))
                .collect(),
            tiebreaker: tiebreaker.to_string(),
            max_sorts,
        })
    }

    pub fn tiebreaker(&self) -> &str {
        &self.tiebreaker
    }

    pub fn max_sorts(&self) -> usize {
        self.max_sorts
    }

    fn is_allowed(&self, field: &str) -> bool {
        field == self.tiebreaker || self.allowed.iter().any(|f| f == field)
    }
}

/// Parse a sort string against the config
///
/// An absent or blank string yields the configured defaults. The result
/// always contains the tiebreaker exactly once, and keys after it are
/// dropped since the tiebreaker already makes the order total.
pub fn parse_sorts(raw: Option<&str>, config: &SortConfig) -> Result<Vec<Sort>, QueryError> {
    let requested: Vec<(String, SortDirection)> = match raw.map(str::trim) {
        None | Some("") => config.defaults.clone(),
        Some(s) => parse_requested(s, config)?,
    };

    let mut sorts: Vec<Sort> = Vec::with_capacity(requested.len() + 1);
    for (field, direction) in requested {
        let tiebreaker = field == config.tiebreaker;
        sorts.push(Sort {
            field,
            direction,
            tiebreaker,
        });
        if tiebreaker {
            break;
        }
    }

    if !sorts.iter().any(|s| s.tiebreaker) {
        let direction = sorts.first().map(|s| s.direction).unwrap_or_default();
        sorts.push(Sort {
            field: config.tiebreaker.clone(),
            direction,
            tiebreaker: true,
        });
    }

    Ok(sorts)
}

fn parse_requested(
    s: &str,
    config: &SortConfig,
) -> Result<Vec<(String, SortDirection)>, QueryError> {
    let items: Vec<&str> = s.split(',').map(str::trim).collect();
    if items.len() > config.max_sorts {
        return Err(QueryError::TooManySorts {
            max: config.max_sorts,
        });
    }

    let mut out: Vec<(String, SortDirection)> = Vec::with_capacity(items.len());
    for item in items {
        let (field, direction) = match item.split_once(':') {
            None => (item, SortDirection::Asc),
            Some((field, dir)) => {
                let direction = SortDirection::parse(dir.trim()).ok_or_else(|| {
                    QueryError::InvalidSortDirection {
                        field: field.to_string(),
                        direction: dir.to_string(),
                    }
                })?;
                (field.trim(), direction)
            }
        };

        if !config.is_allowed(field) {
            return Err(QueryError::UnknownSortField {
                field: field.to_string(),
            });
        }
        if out.iter().any(|(f, _)| f == field) {
            return Err(QueryError::DuplicateSortField {
                field: field.to_string(),
            });
        }
        out.push((field.to_string(), direction));
    }
    Ok(out)
}

/// Canonical text form of a sort list, e.g. `price:asc,id:asc`
pub fn signature(sorts: &[Sort]) -> String {
    sorts
        .iter()
        .map(|s| format!("{}:{}", s.field, s.direction.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::FieldType;

    fn table() -> TableDef {
        TableDef::builder("posts")
            .column("id", FieldType::Integer)
            .column("created_at", FieldType::Date)
            .column("like_count", FieldType::Integer)
            .column("body", FieldType::String)
            .build()
            .unwrap()
    }

    fn config() -> SortConfig {
        SortConfig::new(
            &table(),
            &["created_at", "like_count"],
            &[("created_at", SortDirection::Desc)],
            "id",
            2,
        )
        .unwrap()
    }

    fn tiebreaker_count(sorts: &[Sort]) -> usize {
        sorts.iter().filter(|s| s.field == "id" && s.tiebreaker).count()
    }

    #[test]
    fn defaults_used_when_absent() {
        let sorts = parse_sorts(None, &config()).unwrap();
        assert_eq!(signature(&sorts), "created_at:desc,id:desc");
        assert_eq!(tiebreaker_count(&sorts), 1);

        let sorts = parse_sorts(Some("  "), &config()).unwrap();
        assert_eq!(signature(&sorts), "created_at:desc,id:desc");
    }

    #[test]
    fn missing_direction_defaults_to_asc() {
        let sorts = parse_sorts(Some("like_count"), &config()).unwrap();
        assert_eq!(signature(&sorts), "like_count:asc,id:asc");
    }

    #[test]
    fn tiebreaker_follows_primary_direction() {
        let sorts = parse_sorts(Some("like_count:desc,created_at:asc"), &config()).unwrap();
        assert_eq!(signature(&sorts), "like_count:desc,created_at:asc,id:desc");
        assert!(sorts.last().unwrap().tiebreaker);
    }

    #[test]
    fn explicit_tiebreaker_not_duplicated() {
        let sorts = parse_sorts(Some("id:desc"), &config()).unwrap();
        assert_eq!(sorts.len(), 1);
        assert_eq!(tiebreaker_count(&sorts), 1);
    }

    #[test]
    fn keys_after_tiebreaker_are_dropped() {
        let sorts = parse_sorts(Some("id:asc,like_count:desc"), &config()).unwrap();
        assert_eq!(signature(&sorts), "id:asc");
    }

    #[test]
    fn unknown_sort_field() {
        let err = parse_sorts(Some("body:asc"), &config()).unwrap_err();
        assert!(matches!(err, QueryError::UnknownSortField { field } if field == "body"));
    }

    #[test]
    fn invalid_direction() {
        let err = parse_sorts(Some("like_count:up"), &config()).unwrap_err();
        assert!(matches!(err, QueryError::InvalidSortDirection { .. }));
    }

    #[test]
    fn duplicate_field() {
        let err = parse_sorts(Some("like_count,like_count:desc"), &config()).unwrap_err();
        assert!(matches!(err, QueryError::DuplicateSortField { .. }));
    }

    #[test]
    fn too_many_sorts() {
        let err = parse_sorts(Some("like_count,created_at,id"), &config()).unwrap_err();
        assert!(matches!(err, QueryError::TooManySorts { max: 2 }));
    }

    #[test]
    fn config_validation() {
        let err = SortConfig::new(&table(), &["nope"], &[], "id", 2).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownColumn { .. }));

        let err = SortConfig::new(
            &table(),
            &["like_count"],
            &[("created_at", SortDirection::Asc)],
            "id",
            2,
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSortConfig(_)));

        let err = SortConfig::new(&table(), &[], &[], "id", 0).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSortConfig(_)));
    }

    #[test]
    fn empty_defaults_sort_by_tiebreaker() {
        let config = SortConfig::new(&table(), &["like_count"], &[], "id", 2).unwrap();
        let sorts = parse_sorts(None, &config).unwrap();
        assert_eq!(signature(&sorts), "id:asc");
    }
}
