//! Type mapping and schema translation between Oracle and PostgreSQL.
//!
//! Pure and deterministic: the same source schema always yields the same
//! target schema, so translation is testable without a live connection.

use tracing::debug;

use crate::error::Result;
use crate::schema::{ColumnDefinition, Dialect, TableSchema};

/// Map an Oracle data type to PostgreSQL.
///
/// Returns the target type string and whether the fallback type was used
/// (unrecognized source type). Precedence:
///
/// 1. `NUMBER` with precision and scale → `numeric(p,s)`
/// 2. `NUMBER` with precision only → `numeric(p)`
/// 3. `NUMBER` with neither → `numeric`
/// 4. Length-bearing character type with a known length → `varchar(n)`/`char(n)`
/// 5. Direct table lookup, else the `varchar` fallback.
pub fn oracle_to_postgres(
    oracle_type: &str,
    length: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
) -> (String, bool) {
    let mapped = match oracle_type.to_uppercase().as_str() {
        "NUMBER" => {
            return match (precision, scale) {
                (Some(p), Some(s)) => (format!("numeric({},{})", p, s), false),
                (Some(p), None) => (format!("numeric({})", p), false),
                (None, _) => ("numeric".to_string(), false),
            };
        }

        // Character types keep their declared length when known.
        "VARCHAR2" | "NVARCHAR2" => {
            return match length {
                Some(n) => (format!("varchar({})", n), false),
                None => ("varchar".to_string(), false),
            };
        }
        "CHAR" | "NCHAR" => {
            return match length {
                Some(n) => (format!("char({})", n), false),
                None => ("char".to_string(), false),
            };
        }

        // Date/time
        "DATE" => "timestamp",
        "TIMESTAMP" => "timestamp",

        // Large objects
        "CLOB" => "text",
        "BLOB" => "bytea",

        // Floating point and raw binary
        "FLOAT" => "double precision",
        "RAW" | "LONG RAW" => "bytea",

        // Unrecognized types fall back; the caller records a warning.
        _ => return ("varchar".to_string(), true),
    };

    (mapped.to_string(), false)
}

/// Result of translating a source schema.
#[derive(Debug, Clone)]
pub struct Translation {
    /// The translated PostgreSQL-dialect schema.
    pub schema: TableSchema,

    /// Warnings for fallback type mappings. Never fatal.
    pub warnings: Vec<String>,

    /// Number of column types resolved.
    pub columns_mapped: usize,
}

/// Translate an Oracle table schema into its PostgreSQL counterpart.
///
/// Identifiers are lower-cased on output; every column gets a resolved
/// `target_type`; primary keys are normalized and re-checked against the
/// translated columns (a violation is a Schema error).
pub fn translate(source: &TableSchema) -> Result<Translation> {
    let mut warnings = Vec::new();

    let columns: Vec<ColumnDefinition> = source
        .columns
        .iter()
        .map(|col| {
            let (target_type, fallback) =
                oracle_to_postgres(&col.source_type, col.length, col.precision, col.scale);
            if fallback {
                warnings.push(format!(
                    "column '{}': unrecognized source type '{}', using fallback '{}'",
                    col.name, col.source_type, target_type
                ));
            }
            ColumnDefinition {
                name: col.name.to_lowercase(),
                source_type: col.source_type.clone(),
                target_type: Some(target_type),
                nullable: col.nullable,
                default: col.default.clone(),
                precision: col.precision,
                scale: col.scale,
                length: col.length,
            }
        })
        .collect();

    let columns_mapped = columns.len();

    let translated = TableSchema {
        name: source.name.to_lowercase(),
        columns,
        primary_keys: source.primary_keys.iter().map(|k| k.to_lowercase()).collect(),
        dialect: Dialect::Postgres,
        procedures: source.procedures.clone(),
    };

    translated.validate()?;

    debug!(
        table = %translated.name,
        columns = columns_mapped,
        warnings = warnings.len(),
        "translated schema"
    );

    Ok(Translation {
        schema: translated,
        warnings,
        columns_mapped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_with_precision_and_scale() {
        assert_eq!(
            oracle_to_postgres("NUMBER", None, Some(10), Some(2)).0,
            "numeric(10,2)"
        );
    }

    #[test]
    fn test_number_with_precision_only() {
        assert_eq!(
            oracle_to_postgres("NUMBER", None, Some(10), None).0,
            "numeric(10)"
        );
    }

    #[test]
    fn test_number_bare() {
        assert_eq!(oracle_to_postgres("NUMBER", None, None, None).0, "numeric");
    }

    #[test]
    fn test_character_types() {
        assert_eq!(
            oracle_to_postgres("VARCHAR2", Some(50), None, None).0,
            "varchar(50)"
        );
        assert_eq!(
            oracle_to_postgres("NVARCHAR2", Some(200), None, None).0,
            "varchar(200)"
        );
        assert_eq!(oracle_to_postgres("CHAR", Some(2), None, None).0, "char(2)");
        assert_eq!(oracle_to_postgres("NCHAR", None, None, None).0, "char");
    }

    #[test]
    fn test_date_and_lob_types() {
        assert_eq!(oracle_to_postgres("DATE", None, None, None).0, "timestamp");
        assert_eq!(
            oracle_to_postgres("TIMESTAMP", None, None, None).0,
            "timestamp"
        );
        assert_eq!(oracle_to_postgres("CLOB", None, None, None).0, "text");
        assert_eq!(oracle_to_postgres("BLOB", None, None, None).0, "bytea");
        assert_eq!(oracle_to_postgres("RAW", None, None, None).0, "bytea");
        assert_eq!(oracle_to_postgres("LONG RAW", None, None, None).0, "bytea");
        assert_eq!(
            oracle_to_postgres("FLOAT", None, None, None).0,
            "double precision"
        );
    }

    #[test]
    fn test_unrecognized_type_falls_back_with_flag() {
        let (target, fallback) = oracle_to_postgres("SDO_GEOMETRY", None, None, None);
        assert_eq!(target, "varchar");
        assert!(fallback);
    }

    #[test]
    fn test_type_lookup_is_case_insensitive() {
        assert_eq!(oracle_to_postgres("clob", None, None, None).0, "text");
    }

    fn oracle_table() -> TableSchema {
        use crate::schema::ColumnDefinition as Col;
        TableSchema::new(
            "PATIENTS",
            Dialect::Oracle,
            vec![
                Col::new("ID", "NUMBER").with_precision(10, None).not_null(),
                Col::new("BALANCE", "NUMBER").with_precision(10, Some(2)),
                Col::new("NAME", "VARCHAR2").with_length(50),
                Col::new("NOTES", "CLOB"),
            ],
        )
        .with_primary_keys(vec!["ID".to_string()])
    }

    #[test]
    fn test_translate_lowercases_identifiers() {
        let translation = translate(&oracle_table()).unwrap();
        let schema = &translation.schema;
        assert_eq!(schema.name, "patients");
        assert_eq!(schema.dialect, Dialect::Postgres);
        assert_eq!(schema.primary_keys, vec!["id"]);
        assert_eq!(schema.columns[0].name, "id");
        assert_eq!(schema.columns[0].target_type.as_deref(), Some("numeric(10)"));
        assert_eq!(
            schema.columns[1].target_type.as_deref(),
            Some("numeric(10,2)")
        );
        assert_eq!(schema.columns[2].target_type.as_deref(), Some("varchar(50)"));
        assert_eq!(schema.columns[3].target_type.as_deref(), Some("text"));
        assert!(translation.warnings.is_empty());
    }

    #[test]
    fn test_translate_is_deterministic() {
        let table = oracle_table();
        let first = translate(&table).unwrap();
        let second = translate(&table).unwrap();
        assert_eq!(first.schema, second.schema);
        assert_eq!(first.warnings, second.warnings);
    }

    #[test]
    fn test_translate_records_fallback_warning() {
        let table = TableSchema::new(
            "T",
            Dialect::Oracle,
            vec![crate::schema::ColumnDefinition::new("G", "SDO_GEOMETRY")],
        );
        let translation = translate(&table).unwrap();
        assert_eq!(translation.warnings.len(), 1);
        assert!(translation.warnings[0].contains("SDO_GEOMETRY"));
        assert_eq!(
            translation.schema.columns[0].target_type.as_deref(),
            Some("varchar")
        );
    }

    #[test]
    fn test_translate_rejects_pk_not_in_columns() {
        let table = TableSchema::new(
            "T",
            Dialect::Oracle,
            vec![crate::schema::ColumnDefinition::new("A", "NUMBER")],
        )
        .with_primary_keys(vec!["B".to_string()]);
        assert!(translate(&table).is_err());
    }
}
