//! In-process connector used by the test suite and as a driver reference.
//!
//! Tables are kept in insertion order and rows are paged by offset over that
//! stable order, which satisfies the deterministic-ordering requirement of
//! [`Connector::fetch_rows`]. Column values whose source type is a large
//! object are handed out as [`Lob`] handles on fetch, the way a real driver
//! exposes deferred CLOB/BLOB content. Faults can be scripted for failure
//! tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{MigrateError, Result};
use crate::schema::{Dialect, TableSchema};
use crate::value::{InMemoryLob, Lob, LobKind, Row, Value};

use super::Connector;

struct MemTable {
    schema: TableSchema,
    rows: Vec<Row>,
}

struct MemState {
    connected: bool,
    ever_connected: bool,
    tables: Vec<MemTable>,
    fail_connect: bool,
    /// Error the Nth insert call (0-based) and every call after it.
    fail_insert_from: Option<usize>,
    insert_calls: usize,
}

/// In-memory [`Connector`] implementation.
pub struct MemoryConnector {
    dialect: Dialect,
    state: Mutex<MemState>,
}

impl MemoryConnector {
    /// Create an empty connector for the given dialect.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            state: Mutex::new(MemState {
                connected: false,
                ever_connected: false,
                tables: Vec::new(),
                fail_connect: false,
                fail_insert_from: None,
                insert_calls: 0,
            }),
        }
    }

    /// Seed a table with rows.
    pub fn with_table(self, schema: TableSchema, rows: Vec<Row>) -> Self {
        self.state
            .lock()
            .expect("memory connector lock poisoned")
            .tables
            .push(MemTable { schema, rows });
        self
    }

    /// Make `connect` fail.
    pub fn with_connect_failure(self) -> Self {
        self.state
            .lock()
            .expect("memory connector lock poisoned")
            .fail_connect = true;
        self
    }

    /// Make the Nth `insert_rows` call (0-based) and all later calls fail.
    pub fn with_insert_failure_from(self, call: usize) -> Self {
        self.state
            .lock()
            .expect("memory connector lock poisoned")
            .fail_insert_from = Some(call);
        self
    }

    /// Whether the connector is currently connected.
    pub fn is_connected(&self) -> bool {
        self.state
            .lock()
            .expect("memory connector lock poisoned")
            .connected
    }

    /// Whether `connect` ever succeeded.
    pub fn was_connected(&self) -> bool {
        self.state
            .lock()
            .expect("memory connector lock poisoned")
            .ever_connected
    }

    /// Committed row count for a table, for test assertions.
    pub fn stored_row_count(&self, table: &str) -> usize {
        let state = self.state.lock().expect("memory connector lock poisoned");
        state
            .tables
            .iter()
            .find(|t| t.schema.name == table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    /// Schema of a stored table, for test assertions.
    pub fn stored_schema(&self, table: &str) -> Option<TableSchema> {
        let state = self.state.lock().expect("memory connector lock poisoned");
        state
            .tables
            .iter()
            .find(|t| t.schema.name == table)
            .map(|t| t.schema.clone())
    }

    fn side(&self) -> String {
        self.dialect.to_string()
    }

    fn require_connected(state: &MemState, side: &str) -> Result<()> {
        if !state.connected {
            return Err(MigrateError::connection(side, "not connected"));
        }
        Ok(())
    }
}

/// Re-materialize a stored value for fetch, wrapping large-object columns in
/// fresh handles.
fn fetch_value(value: &Value, source_type: &str) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match (source_type.to_uppercase().as_str(), value) {
        ("CLOB", Value::Text(text)) => Ok(Value::Lob(Lob::new(
            LobKind::Text,
            Box::new(InMemoryLob(text.as_bytes().to_vec())),
        ))),
        ("BLOB", Value::Bytes(bytes)) => Ok(Value::Lob(Lob::new(
            LobKind::Binary,
            Box::new(InMemoryLob(bytes.clone())),
        ))),
        _ => value.try_clone(),
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<()> {
        let mut state = self.state.lock().expect("memory connector lock poisoned");
        if state.fail_connect {
            return Err(MigrateError::connection(self.side(), "connection refused"));
        }
        state.connected = true;
        state.ever_connected = true;
        debug!(dialect = %self.dialect, "memory connector connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.lock().expect("memory connector lock poisoned");
        state.connected = false;
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        let state = self.state.lock().expect("memory connector lock poisoned");
        Self::require_connected(&state, &self.side())?;
        Ok(state.tables.iter().map(|t| t.schema.name.clone()).collect())
    }

    async fn table_schema(&self, table: &str) -> Result<TableSchema> {
        let state = self.state.lock().expect("memory connector lock poisoned");
        Self::require_connected(&state, &self.side())?;
        state
            .tables
            .iter()
            .find(|t| t.schema.name == table)
            .map(|t| t.schema.clone())
            .ok_or_else(|| MigrateError::schema(format!("unknown table '{}'", table)))
    }

    async fn count_rows(&self, table: &str) -> Result<u64> {
        let state = self.state.lock().expect("memory connector lock poisoned");
        Self::require_connected(&state, &self.side())?;
        state
            .tables
            .iter()
            .find(|t| t.schema.name == table)
            .map(|t| t.rows.len() as u64)
            .ok_or_else(|| MigrateError::schema(format!("unknown table '{}'", table)))
    }

    async fn fetch_rows(&self, table: &str, limit: usize, offset: u64) -> Result<Vec<Row>> {
        let state = self.state.lock().expect("memory connector lock poisoned");
        Self::require_connected(&state, &self.side())?;
        let mem = state
            .tables
            .iter()
            .find(|t| t.schema.name == table)
            .ok_or_else(|| MigrateError::schema(format!("unknown table '{}'", table)))?;

        let start = (offset as usize).min(mem.rows.len());
        let end = start.saturating_add(limit).min(mem.rows.len());

        let mut page = Vec::with_capacity(end - start);
        for row in &mem.rows[start..end] {
            let mut out = Row::new();
            for (name, value) in row.iter() {
                let source_type = mem
                    .schema
                    .column(name)
                    .map(|c| c.source_type.as_str())
                    .unwrap_or("");
                out.push(name, fetch_value(value, source_type)?);
            }
            page.push(out);
        }
        Ok(page)
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<()> {
        let mut state = self.state.lock().expect("memory connector lock poisoned");
        Self::require_connected(&state, &self.side())?;

        for col in &schema.columns {
            if col.target_type.is_none() {
                return Err(MigrateError::schema(format!(
                    "column '{}.{}' has no resolved target type",
                    schema.name, col.name
                )));
            }
        }

        // CREATE TABLE IF NOT EXISTS semantics.
        if state.tables.iter().any(|t| t.schema.name == schema.name) {
            return Ok(());
        }
        state.tables.push(MemTable {
            schema: schema.clone(),
            rows: Vec::new(),
        });
        Ok(())
    }

    async fn insert_rows(&self, table: &str, rows: Vec<Row>) -> Result<u64> {
        let mut state = self.state.lock().expect("memory connector lock poisoned");
        Self::require_connected(&state, &self.side())?;

        let call = state.insert_calls;
        state.insert_calls += 1;
        if matches!(state.fail_insert_from, Some(from) if call >= from) {
            // Nothing from this call is committed.
            return Err(MigrateError::transfer(table, "insert rejected"));
        }

        for row in &rows {
            if row.iter().any(|(_, v)| v.is_lob()) {
                return Err(MigrateError::transfer(
                    table,
                    "row contains an undrained large-object handle",
                ));
            }
        }

        let mem = state
            .tables
            .iter_mut()
            .find(|t| t.schema.name == table)
            .ok_or_else(|| MigrateError::transfer(table, "table does not exist"))?;

        let count = rows.len() as u64;
        mem.rows.extend(rows);
        Ok(count)
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }
}
