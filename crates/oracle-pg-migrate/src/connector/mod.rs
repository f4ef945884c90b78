//! The connector capability: the contract every database driver satisfies.
//!
//! The migration engine is written entirely against [`Connector`]; concrete
//! Oracle/PostgreSQL drivers live outside this crate. [`memory::MemoryConnector`]
//! is an in-process implementation used by the test suite and as a reference
//! for driver authors.

pub mod memory;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{MigrateError, Result};
use crate::schema::{Dialect, TableSchema};
use crate::value::Row;

/// Uniform contract for a database driver.
///
/// Methods take `&self`; implementations use interior mutability for their
/// connection state. `disconnect` must be safe to call even if `connect`
/// never succeeded, and `insert_rows` is all-or-nothing per call: commit on
/// success, roll back that call's rows on failure, leaving prior calls'
/// commits intact.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish the connection.
    async fn connect(&self) -> Result<()>;

    /// Close the connection. Idempotent.
    async fn disconnect(&self) -> Result<()>;

    /// List all tables visible to the connection.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Read the schema for one table.
    async fn table_schema(&self, table: &str) -> Result<TableSchema>;

    /// Count the rows in a table.
    async fn count_rows(&self, table: &str) -> Result<u64>;

    /// Fetch a page of up to `limit` rows starting at `offset`.
    ///
    /// Pages must be ordered by a deterministic, stable key so that a full
    /// offset scan visits every row exactly once.
    async fn fetch_rows(&self, table: &str, limit: usize, offset: u64) -> Result<Vec<Row>>;

    /// Create a table from a translated schema. Creating an already-existing
    /// table is not an error.
    async fn create_table(&self, schema: &TableSchema) -> Result<()>;

    /// Insert a batch of rows as one all-or-nothing unit.
    ///
    /// Returns the number of rows committed.
    async fn insert_rows(&self, table: &str, rows: Vec<Row>) -> Result<u64>;

    /// The dialect this connector speaks.
    fn dialect(&self) -> Dialect;
}

/// Run a connector operation under a deadline.
///
/// Connector calls are the engine's only suspension points; a hung driver
/// must not wedge the job forever.
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(MigrateError::timeout(operation)),
    }
}
