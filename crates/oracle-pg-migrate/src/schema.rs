//! Schema metadata types for tables and columns.
//!
//! These types provide a database-agnostic representation of table structure
//! used throughout the migration process. Source connectors produce them with
//! `target_type` unset; the translator fills it in.

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// Database dialect tag carried on a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Oracle,
    Postgres,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Oracle => write!(f, "oracle"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// A stored-procedure reference discovered for a table.
///
/// Procedures are carried as metadata only; translating their bodies is the
/// job of the procedure-conversion extension point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureRef {
    /// Procedure or package name.
    pub name: String,

    /// Object type as reported by the catalog (e.g. "PROCEDURE", "FUNCTION").
    pub kind: String,
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,

    /// Type name in the source dialect (e.g. "NUMBER", "VARCHAR2").
    pub source_type: String,

    /// Resolved type string in the target dialect. `None` until translated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,

    /// Whether the column allows NULL.
    pub nullable: bool,

    /// Default expression, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Numeric precision, used only during translation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,

    /// Numeric scale, used only during translation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,

    /// Character length, used only during translation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
}

impl ColumnDefinition {
    /// Create a column with just a name and source type; everything else
    /// defaults to a nullable column with no modifiers.
    pub fn new(name: impl Into<String>, source_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_type: source_type.into(),
            target_type: None,
            nullable: true,
            default: None,
            precision: None,
            scale: None,
            length: None,
        }
    }

    /// Set numeric precision and scale.
    pub fn with_precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    /// Set character length.
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Set nullability.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Table metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,

    /// Ordered column definitions.
    pub columns: Vec<ColumnDefinition>,

    /// Primary key column names. Must be a subset of column names.
    pub primary_keys: Vec<String>,

    /// Dialect this schema belongs to.
    pub dialect: Dialect,

    /// Stored procedures discovered for this table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procedures: Vec<ProcedureRef>,
}

impl TableSchema {
    /// Create a schema with no primary key and no procedures.
    pub fn new(name: impl Into<String>, dialect: Dialect, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            columns,
            primary_keys: Vec::new(),
            dialect,
            procedures: Vec::new(),
        }
    }

    /// Set the primary key column names.
    pub fn with_primary_keys(mut self, keys: Vec<String>) -> Self {
        self.primary_keys = keys;
        self
    }

    /// Look up a column by case-normalized name.
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Check the primary-key subset invariant: every primary-key name must
    /// exist among the columns.
    pub fn validate(&self) -> Result<()> {
        for pk in &self.primary_keys {
            if self.column(pk).is_none() {
                return Err(MigrateError::schema(format!(
                    "primary key column '{}' does not exist in table '{}'",
                    pk, self.name
                )));
            }
        }
        Ok(())
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> TableSchema {
        TableSchema::new(
            "PATIENTS",
            Dialect::Oracle,
            vec![
                ColumnDefinition::new("ID", "NUMBER").not_null(),
                ColumnDefinition::new("NAME", "VARCHAR2").with_length(100),
            ],
        )
        .with_primary_keys(vec!["ID".to_string()])
    }

    #[test]
    fn test_validate_accepts_pk_subset() {
        assert!(sample_table().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_pk_column() {
        let mut table = sample_table();
        table.primary_keys.push("MISSING".to_string());
        let err = table.validate().unwrap_err();
        assert!(matches!(err, MigrateError::Schema(_)));
        assert!(err.to_string().contains("MISSING"));
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = sample_table();
        assert!(table.column("name").is_some());
        assert!(table.column("NAME").is_some());
        assert!(table.column("missing").is_none());
    }
}
