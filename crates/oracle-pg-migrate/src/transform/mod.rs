//! Row transformation between source and target shapes.
//!
//! A fetched row carries the source's column names and may hold deferred
//! large-object handles. Transformation renames columns to the translated
//! target schema, drains every large object into an inline value, and drops
//! columns the target schema does not know about. Values are otherwise
//! passed through untouched, the drivers on either side own dialect-level
//! encoding.

use tracing::trace;

use crate::error::Result;
use crate::schema::TableSchema;
use crate::value::{Row, Value};

/// Transform one fetched row into the target schema's shape.
///
/// Matching is by case-insensitive column name. Target columns with no
/// counterpart in the row are omitted rather than nulled, so partial
/// projections survive the round trip. Large-object handles are read to
/// completion here, which makes this the only point in the pipeline that
/// performs LOB I/O.
pub async fn transform_row(mut row: Row, target: &TableSchema) -> Result<Row> {
    let mut out = Row::new();
    for column in &target.columns {
        let Some(value) = row.take(&column.name) else {
            continue;
        };
        let value = match value {
            Value::Lob(lob) => lob.materialize().await?,
            other => other,
        };
        out.push(&column.name, value);
    }
    Ok(out)
}

/// Transform a whole batch. Stops at the first failing row.
pub async fn transform_batch(rows: Vec<Row>, target: &TableSchema) -> Result<Vec<Row>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(transform_row(row, target).await?);
    }
    trace!(table = %target.name, rows = out.len(), "transformed batch");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDefinition, Dialect};
    use crate::value::{InMemoryLob, Lob, LobKind};

    fn target() -> TableSchema {
        TableSchema::new(
            "orders",
            Dialect::Postgres,
            vec![
                ColumnDefinition::new("id", "NUMBER"),
                ColumnDefinition::new("note", "CLOB"),
            ],
        )
    }

    #[tokio::test]
    async fn test_columns_match_case_insensitively_and_rename() {
        let row = Row::new()
            .with("ID", Value::Int(7))
            .with("NOTE", Value::Text("hi".into()));
        let out = transform_row(row, &target()).await.unwrap();
        assert_eq!(out.iter().map(|(n, _)| n).collect::<Vec<_>>(), ["id", "note"]);
        assert_eq!(out.get("id"), Some(&Value::Int(7)));
    }

    #[tokio::test]
    async fn test_unmatched_source_columns_are_dropped() {
        let row = Row::new()
            .with("ID", Value::Int(1))
            .with("NOTE", Value::Null)
            .with("LEGACY_FLAG", Value::Bool(true));
        let out = transform_row(row, &target()).await.unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.get("LEGACY_FLAG").is_none());
    }

    #[tokio::test]
    async fn test_missing_target_column_is_omitted_not_nulled() {
        let row = Row::new().with("ID", Value::Int(1));
        let out = transform_row(row, &target()).await.unwrap();
        assert_eq!(out.len(), 1);
        assert!(out.get("note").is_none());
    }

    #[tokio::test]
    async fn test_text_lob_materializes_inline() {
        let lob = Lob::new(LobKind::Text, Box::new(InMemoryLob(b"body".to_vec())));
        let row = Row::new()
            .with("ID", Value::Int(1))
            .with("NOTE", Value::Lob(lob));
        let out = transform_row(row, &target()).await.unwrap();
        assert_eq!(out.get("note"), Some(&Value::Text("body".into())));
    }

    #[tokio::test]
    async fn test_invalid_utf8_text_lob_fails() {
        let lob = Lob::new(LobKind::Text, Box::new(InMemoryLob(vec![0xff, 0xfe])));
        let row = Row::new().with("NOTE", Value::Lob(lob));
        assert!(transform_row(row, &target()).await.is_err());
    }

    #[tokio::test]
    async fn test_null_passes_through() {
        let row = Row::new().with("NOTE", Value::Null);
        let out = transform_row(row, &target()).await.unwrap();
        assert_eq!(out.get("note"), Some(&Value::Null));
    }
}
