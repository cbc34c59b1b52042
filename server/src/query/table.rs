//! Table definitions
//!
//! A `TableDef` describes the columns an endpoint exposes. Every registry and
//! config in the query layer is validated against one, so identifiers that
//! reach generated SQL always come from here.

use super::error::RegistryError;
use super::types::FieldType;

/// Maximum identifier length (matches PostgreSQL's NAMEDATALEN - 1)
const MAX_IDENTIFIER_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: FieldType,
    pub nullable: bool,
}

#[derive(Debug, Clone)]
pub struct TableDef {
    name: String,
    columns: Vec<Column>,
}

/// Builder collecting columns before validation
#[derive(Debug)]
pub struct TableDefBuilder {
    name: String,
    columns: Vec<Column>,
}

impl TableDef {
    pub fn builder(name: impl Into<String>) -> TableDefBuilder {
        TableDefBuilder {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column, failing with a registration error when missing
    pub(crate) fn require(&self, field: &str) -> Result<&Column, RegistryError> {
        self.column(field).ok_or_else(|| RegistryError::UnknownColumn {
            table: self.name.clone(),
            field: field.to_string(),
        })
    }
}

impl TableDefBuilder {
    /// Add a NOT NULL column
    pub fn column(mut self, name: &str, ty: FieldType) -> Self {
        self.columns.push(Column {
            name: name.to_string(),
            ty,
            nullable: false,
        });
        self
    }

    /// Add a nullable column
    pub fn nullable(mut self, name: &str, ty: FieldType) -> Self {
        self.columns.push(Column {
            name: name.to_string(),
            ty,
            nullable: true,
        });
        self
    }

    pub fn build(self) -> Result<TableDef, RegistryError> {
        if !is_valid_identifier(&self.name) {
            return Err(RegistryError::InvalidIdentifier(self.name));
        }
        if self.columns.is_empty() {
            return Err(RegistryError::EmptyTable(self.name));
        }
        for (i, column) in self.columns.iter().enumerate() {
            if !is_valid_identifier(&column.name) {
                return Err(RegistryError::InvalidIdentifier(column.name.clone()));
            }
            if self.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(RegistryError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        Ok(TableDef {
            name: self.name,
            columns: self.columns,
        })
    }
}

/// Lowercase snake_case identifier safe to splice into SQL
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    s.len() <= MAX_IDENTIFIER_LEN
        && (first.is_ascii_lowercase() || first == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
