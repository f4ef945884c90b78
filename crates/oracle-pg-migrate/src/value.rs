//! Row value types for database-agnostic data transfer.
//!
//! A [`Value`] is a tagged variant: NULL, a materialized scalar, or a
//! [`Lob`] handle whose content is still deferred on the source side. The
//! transformer drains `Lob` values to their materialized forms before rows
//! reach the target connector.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::error::{MigrateError, Result};

/// Kind of a large object, deciding its materialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobKind {
    /// Character large object; materializes to [`Value::Text`].
    Text,
    /// Binary large object; materializes to [`Value::Bytes`].
    Binary,
}

/// Streamed/deferred content behind a large-object handle.
///
/// The only obligation on implementors is to yield the complete content on
/// demand; the engine never issues partial reads.
#[async_trait]
pub trait LobRead: Send {
    /// Read the full content of the large object.
    async fn read_to_end(self: Box<Self>) -> Result<Vec<u8>>;
}

/// A large-object handle supplied inside a fetched row.
pub struct Lob {
    kind: LobKind,
    reader: Box<dyn LobRead>,
}

impl Lob {
    /// Wrap an open large-object reader.
    pub fn new(kind: LobKind, reader: Box<dyn LobRead>) -> Self {
        Self { kind, reader }
    }

    /// The kind of this large object.
    pub fn kind(&self) -> LobKind {
        self.kind
    }

    /// Fully read the handle and return the materialized value.
    ///
    /// Text lobs must be valid UTF-8; binary lobs become byte sequences.
    pub async fn materialize(self) -> Result<Value> {
        let bytes = self.reader.read_to_end().await?;
        match self.kind {
            LobKind::Text => {
                let text = String::from_utf8(bytes).map_err(|e| {
                    MigrateError::LargeObject(format!("clob content is not valid utf-8: {}", e))
                })?;
                Ok(Value::Text(text))
            }
            LobKind::Binary => Ok(Value::Bytes(bytes)),
        }
    }
}

impl std::fmt::Debug for Lob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lob").field("kind", &self.kind).finish()
    }
}

/// An already-materialized large object, used by in-process connectors and
/// tests to hand out handles over buffered content.
pub struct InMemoryLob(pub Vec<u8>);

#[async_trait]
impl LobRead for InMemoryLob {
    async fn read_to_end(self: Box<Self>) -> Result<Vec<u8>> {
        Ok(self.0)
    }
}

/// A single cell value.
#[derive(Debug)]
pub enum Value {
    /// SQL NULL.
    Null,

    /// Boolean scalar.
    Bool(bool),

    /// 64-bit signed integer.
    Int(i64),

    /// 64-bit floating point.
    Float(f64),

    /// Exact decimal (Oracle NUMBER with scale).
    Decimal(Decimal),

    /// Timestamp without timezone.
    Timestamp(NaiveDateTime),

    /// Materialized character data.
    Text(String),

    /// Materialized byte sequence.
    Bytes(Vec<u8>),

    /// Deferred large-object content; drained by the transformer.
    Lob(Lob),
}

impl Value {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is an undrained large-object handle.
    #[must_use]
    pub fn is_lob(&self) -> bool {
        matches!(self, Value::Lob(_))
    }

    /// Clone a materialized value. Fails for `Lob` handles, which own an
    /// open reader and cannot be duplicated.
    pub fn try_clone(&self) -> Result<Value> {
        match self {
            Value::Null => Ok(Value::Null),
            Value::Bool(v) => Ok(Value::Bool(*v)),
            Value::Int(v) => Ok(Value::Int(*v)),
            Value::Float(v) => Ok(Value::Float(*v)),
            Value::Decimal(v) => Ok(Value::Decimal(*v)),
            Value::Timestamp(v) => Ok(Value::Timestamp(*v)),
            Value::Text(v) => Ok(Value::Text(v.clone())),
            Value::Bytes(v) => Ok(Value::Bytes(v.clone())),
            Value::Lob(_) => Err(MigrateError::LargeObject(
                "cannot clone an open large-object handle".into(),
            )),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            // Open handles have no observable content to compare.
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

/// A fetched or transformed row: ordered (column name, value) pairs.
///
/// Name-carrying rows let the transformer resolve column correspondence by
/// case-normalized name rather than by position.
#[derive(Debug, Default, PartialEq)]
pub struct Row {
    values: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a named value.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.values.push((name.into(), value));
    }

    /// Builder-style append.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    /// Number of values in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row carries no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow a value by case-normalized column name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Move a value out of the row by case-normalized column name, leaving
    /// NULL in its place. Returns `None` when the column is absent.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.values
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| std::mem::replace(v, Value::Null))
    }

    /// Iterate over (name, value) pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_lob_materializes_to_text() {
        let lob = Lob::new(LobKind::Text, Box::new(InMemoryLob(b"case notes".to_vec())));
        let value = lob.materialize().await.unwrap();
        assert_eq!(value, Value::Text("case notes".to_string()));
    }

    #[tokio::test]
    async fn test_binary_lob_materializes_to_bytes() {
        let lob = Lob::new(LobKind::Binary, Box::new(InMemoryLob(vec![0xde, 0xad])));
        let value = lob.materialize().await.unwrap();
        assert_eq!(value, Value::Bytes(vec![0xde, 0xad]));
    }

    #[tokio::test]
    async fn test_text_lob_rejects_invalid_utf8() {
        let lob = Lob::new(LobKind::Text, Box::new(InMemoryLob(vec![0xff, 0xfe])));
        let err = lob.materialize().await.unwrap_err();
        assert!(matches!(err, MigrateError::LargeObject(_)));
    }

    #[test]
    fn test_row_take_is_case_insensitive() {
        let mut row = Row::new().with("PATIENT_ID", Value::Int(7));
        assert_eq!(row.take("patient_id"), Some(Value::Int(7)));
        // Taken values are replaced with NULL, not removed.
        assert_eq!(row.get("patient_id"), Some(&Value::Null));
        assert_eq!(row.take("missing"), None);
    }

    #[test]
    fn test_try_clone_rejects_lob() {
        let value = Value::Lob(Lob::new(LobKind::Text, Box::new(InMemoryLob(vec![]))));
        assert!(value.try_clone().is_err());
        assert!(Value::Int(1).try_clone().is_ok());
    }
}
