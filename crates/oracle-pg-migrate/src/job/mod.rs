//! Migration job record: request, phases, counters, progress, log.
//!
//! A [`MigrationJob`] is the single unit of work the orchestrator drives. It
//! is plain serializable data, cloned whole whenever a snapshot is published
//! to the [`store::JobStore`], so observers never see a half-updated record.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{SourceConfig, TargetConfig};

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Processing phase of a running migration.
///
/// Phases advance strictly forward. Any phase may drop to `Failed`, and
/// `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SchemaAnalysis,
    TypeConversion,
    DataMigration,
    ProcedureConversion,
    Validation,
    Completed,
    Failed,
}

impl Phase {
    fn order(self) -> u8 {
        match self {
            Phase::SchemaAnalysis => 0,
            Phase::TypeConversion => 1,
            Phase::DataMigration => 2,
            Phase::ProcedureConversion => 3,
            Phase::Validation => 4,
            Phase::Completed => 5,
            Phase::Failed => 6,
        }
    }

    /// Whether this phase is one of the two terminal states.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }

    /// Whether moving from `self` to `next` is legal. Terminal phases admit
    /// no transition at all, not even to `Failed`.
    pub fn can_transition(self, next: Phase) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Phase::Failed {
            return true;
        }
        next.order() > self.order()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::SchemaAnalysis => "schema_analysis",
            Phase::TypeConversion => "type_conversion",
            Phase::DataMigration => "data_migration",
            Phase::ProcedureConversion => "procedure_conversion",
            Phase::Validation => "validation",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic counters accumulated across a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub tables_processed: u64,
    pub rows_migrated: u64,
    pub schema_conversions: u64,
    pub type_conversions: u64,
    pub stored_procedures: u64,
}

/// Per-table progress snapshot published after each committed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableProgress {
    pub table: String,
    pub rows_processed: u64,
    pub total_rows: u64,
    pub percentage: u8,
}

impl TableProgress {
    pub fn new(table: impl Into<String>, rows_processed: u64, total_rows: u64) -> Self {
        let percentage = if total_rows == 0 {
            100
        } else {
            (rows_processed.saturating_mul(100) / total_rows).min(100) as u8
        };
        Self {
            table: table.into(),
            rows_processed,
            total_rows,
            percentage,
        }
    }
}

/// What the caller asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRequest {
    pub source: SourceConfig,
    pub target: TargetConfig,
    /// Tables to migrate; empty means every table the source lists.
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub exclude_tables: Vec<String>,
    #[serde(default)]
    pub only_schema: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Timeout for a single connector call, in seconds.
    #[serde(default = "default_op_timeout_secs")]
    pub op_timeout_secs: u64,
}

impl MigrationRequest {
    pub fn op_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.op_timeout_secs)
    }
}

fn default_batch_size() -> usize {
    1000
}

fn default_op_timeout_secs() -> u64 {
    30
}

/// Full state of one migration, snapshot-published to the job store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationJob {
    pub id: String,
    pub request: MigrationRequest,
    pub status: JobStatus,
    pub phase: Phase,
    pub current_table: Option<String>,
    /// Tables selected during schema analysis, in migration order.
    pub tables: Vec<String>,
    pub stats: Stats,
    pub progress: Option<TableProgress>,
    pub log: Vec<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MigrationJob {
    pub fn new(request: MigrationRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            request,
            status: JobStatus::Pending,
            phase: Phase::SchemaAnalysis,
            current_table: None,
            tables: Vec::new(),
            stats: Stats::default(),
            progress: None,
            log: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to the next phase. Illegal transitions are ignored with a log
    /// line rather than panicking, the state machine is append-only.
    pub fn advance(&mut self, next: Phase) {
        if !self.phase.can_transition(next) {
            self.record(format!(
                "ignored illegal phase transition {} -> {}",
                self.phase, next
            ));
            return;
        }
        self.phase = next;
        if next == Phase::Completed {
            self.status = JobStatus::Completed;
            self.current_table = None;
        }
        self.record(format!("phase: {}", next));
    }

    /// Terminal failure. Records the phase that was active when the error
    /// struck before switching to `Failed`. A job already in a terminal
    /// phase stays as it is.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.phase.is_terminal() {
            self.record(format!("ignored failure after {}: {}", self.phase, message));
            return;
        }
        self.record(format!("failed during {}: {}", self.phase, message));
        self.phase = Phase::Failed;
        self.status = JobStatus::Failed;
        self.error = Some(message);
    }

    /// Append a log line and bump the update timestamp.
    pub fn record(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        self.updated_at = Utc::now();
    }
}
