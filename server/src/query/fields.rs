//! Sparse field selection (`fields=a,b` or `fields=*`)

use super::error::{QueryError, RegistryError};
use super::table::TableDef;

/// Which fields an endpoint lets callers select
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelectionConfig {
    /// `fields` is rejected; every column is rendered
    Disabled,
    /// `fields` may name any of these; they are also the default projection
    Allowed(Vec<String>),
}

impl FieldSelectionConfig {
    pub fn allowed(table: &TableDef, fields: &[&str]) -> Result<Self, RegistryError> {
        if fields.is_empty() {
            return Err(RegistryError::InvalidFieldSelection(
                "allow-list is empty".to_string(),
            ));
        }
        for field in fields {
            table.require(field)?;
        }
        let mut out: Vec<String> = Vec::with_capacity(fields.len());
        for field in fields {
            if !out.iter().any(|f| f == field) {
                out.push(field.to_string());
            }
        }
        Ok(Self::Allowed(out))
    }

    /// Fields rendered for a given selection, in response order
    pub fn visible(&self, selection: &FieldSelection, table: &TableDef) -> Vec<String> {
        match (selection, self) {
            (FieldSelection::Only(fields), _) => fields.clone(),
            (FieldSelection::All, Self::Allowed(fields)) => fields.clone(),
            (FieldSelection::All, Self::Disabled) => {
                table.columns().iter().map(|c| c.name.clone()).collect()
            }
        }
    }
}

/// Parsed `fields` parameter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldSelection {
    #[default]
    All,
    Only(Vec<String>),
}

/// Parse the `fields` parameter; blank and `*` both mean "all"
pub fn parse_fields(
    raw: Option<&str>,
    config: &FieldSelectionConfig,
) -> Result<FieldSelection, QueryError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(FieldSelection::All),
        Some(raw) => raw,
    };

    let allowed = match config {
        FieldSelectionConfig::Disabled => return Err(QueryError::FieldSelectionDisabled),
        FieldSelectionConfig::Allowed(allowed) => allowed,
    };
    if raw == "*" {
        return Ok(FieldSelection::All);
    }

    let mut fields: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim) {
        if !allowed.iter().any(|f| f == item) {
            return Err(QueryError::UnknownField {
                field: item.to_string(),
            });
        }
        if !fields.iter().any(|f| f == item) {
            fields.push(item.to_string());
        }
    }
    Ok(FieldSelection::Only(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::FieldType;

    fn table() -> TableDef {
        TableDef::builder("products")
            .column("id", FieldType::Integer)
            .column("name", FieldType::String)
            .column("price", FieldType::Number)
            .column("seller_id", FieldType::String)
            .build()
            .unwrap()
    }

    fn config() -> FieldSelectionConfig {
        FieldSelectionConfig::allowed(&table(), &["id", "name", "price"]).unwrap()
    }

    #[test]
    fn parses_subset_and_dedupes() {
        let selection = parse_fields(Some("name, id,name"), &config()).unwrap();
        assert_eq!(
            selection,
            FieldSelection::Only(vec!["name".into(), "id".into()])
        );
        assert_eq!(config().visible(&selection, &table()), vec!["name", "id"]);
    }

    #[test]
    fn star_and_blank_mean_all() {
        assert_eq!(parse_fields(Some("*"), &config()).unwrap(), FieldSelection::All);
        assert_eq!(parse_fields(Some(""), &config()).unwrap(), FieldSelection::All);
        assert_eq!(parse_fields(None, &config()).unwrap(), FieldSelection::All);
        assert_eq!(
            config().visible(&FieldSelection::All, &table()),
            vec!["id", "name", "price"]
        );
    }

    #[test]
    fn rejects_fields_outside_allow_list() {
        let err = parse_fields(Some("id,seller_id"), &config()).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { field } if field == "seller_id"));

        let err = parse_fields(Some("id,,name"), &config()).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField { .. }));
    }

    #[test]
    fn disabled_selection() {
        let config = FieldSelectionConfig::Disabled;
        let err = parse_fields(Some("id"), &config).unwrap_err();
        assert!(matches!(err, QueryError::FieldSelectionDisabled));
        assert_eq!(config.visible(&FieldSelection::All, &table()).len(), 4);
    }

    #[test]
    fn config_validated_against_table() {
        assert!(FieldSelectionConfig::allowed(&table(), &[]).is_err());
        assert!(matches!(
            FieldSelectionConfig::allowed(&table(), &["stock"]),
            Err(RegistryError::UnknownColumn { .. })
        ));
    }
}
