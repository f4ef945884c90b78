//! # oracle-pg-migrate
//!
//! Oracle to PostgreSQL migration library.
//!
//! This library provides the core engine for migrating schema and data from
//! an Oracle source to a PostgreSQL target:
//!
//! - **Schema translation** via an explicit Oracle-to-PostgreSQL type map
//! - **Row transformation** with large-object (CLOB/BLOB) materialization
//! - **Batched transfer** with per-table progress accounting
//! - **Phase state machine** sequencing analysis, conversion, transfer,
//!   and validation, with safe failure and unconditional cleanup
//!
//! Concrete database drivers, the request-handling layer, and durable job
//! storage are external collaborators behind the [`connector::Connector`]
//! and [`job::store::JobStore`] traits.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use oracle_pg_migrate::{
//!     connector::memory::MemoryConnector, job::store::MemoryJobStore,
//!     schema::Dialect, MigrationJob, MigrationRequest, Orchestrator,
//! };
//!
//! # async fn run(request: MigrationRequest) -> oracle_pg_migrate::Result<()> {
//! let store = Arc::new(MemoryJobStore::new());
//! let source = MemoryConnector::new(Dialect::Oracle);
//! let target = MemoryConnector::new(Dialect::Postgres);
//!
//! let job = MigrationJob::new(request);
//! let orchestrator = Orchestrator::new(store);
//! let finished = orchestrator.run(job, &source, &target, None).await?;
//! println!("migrated {} rows", finished.stats.rows_migrated);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod schema;
pub mod transfer;
pub mod transform;
pub mod typemap;
pub mod value;

// Re-exports for convenient access
pub use config::{Config, MigrationOptions, SourceConfig, TargetConfig};
pub use error::{MigrateError, Result};
pub use job::store::{JobStore, JobSummary, MemoryJobStore};
pub use job::{JobStatus, MigrationJob, MigrationRequest, Phase, Stats, TableProgress};
pub use orchestrator::{Orchestrator, PhaseHook};
pub use schema::{ColumnDefinition, Dialect, ProcedureRef, TableSchema};
pub use transfer::{BatchSink, TransferEngine, TransferStats};
pub use value::{Lob, LobKind, LobRead, Row, Value};
