//! Migration orchestrator - phase state machine driving one job.
//!
//! The orchestrator sequences schema analysis, type conversion, data
//! migration, the procedure-conversion and validation hooks, and completion.
//! Every error is caught at this boundary and converted into the job's
//! terminal failed state; connectors are disconnected on every exit path.
//! Job snapshots are published to the injected [`JobStore`] after each phase
//! transition, table step, and committed batch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::connector::{with_timeout, Connector};
use crate::error::{MigrateError, Result};
use crate::job::store::JobStore;
use crate::job::{JobStatus, MigrationJob, Phase, TableProgress};
use crate::schema::TableSchema;
use crate::transfer::{BatchSink, TransferEngine};
use crate::typemap::translate;
use crate::value::Row;

/// Extension point for the procedure-conversion and validation phases.
///
/// The built-in hooks are no-ops; real implementations live outside this
/// crate.
#[async_trait]
pub trait PhaseHook: Send + Sync {
    async fn run(
        &self,
        job: &mut MigrationJob,
        source: &dyn Connector,
        target: &dyn Connector,
    ) -> Result<()>;
}

/// Default hook that does nothing.
pub struct NoopHook;

#[async_trait]
impl PhaseHook for NoopHook {
    async fn run(
        &self,
        _job: &mut MigrationJob,
        _source: &dyn Connector,
        _target: &dyn Connector,
    ) -> Result<()> {
        Ok(())
    }
}

/// Migration orchestrator.
pub struct Orchestrator<S: JobStore> {
    store: Arc<S>,
    procedure_hook: Box<dyn PhaseHook>,
    validation_hook: Box<dyn PhaseHook>,
}

impl<S: JobStore> Orchestrator<S> {
    /// Create an orchestrator with no-op procedure and validation hooks.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            procedure_hook: Box::new(NoopHook),
            validation_hook: Box::new(NoopHook),
        }
    }

    /// Replace the procedure-conversion hook.
    pub fn with_procedure_hook(mut self, hook: Box<dyn PhaseHook>) -> Self {
        self.procedure_hook = hook;
        self
    }

    /// Replace the validation hook.
    pub fn with_validation_hook(mut self, hook: Box<dyn PhaseHook>) -> Self {
        self.validation_hook = hook;
        self
    }

    /// Run one migration to its terminal state.
    ///
    /// Engine faults never escape as `Err`; they become the returned job's
    /// failed state. The `Err` path is reserved for the job store itself.
    pub async fn run(
        &self,
        mut job: MigrationJob,
        source: &dyn Connector,
        target: &dyn Connector,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<MigrationJob> {
        // A run without a caller-supplied cancel channel gets one that never
        // fires; the sender must outlive the run.
        let (_guard, cancel) = match cancel {
            Some(rx) => (None, rx),
            None => {
                let (tx, rx) = watch::channel(false);
                (Some(tx), rx)
            }
        };

        info!(job = %job.id, "starting migration");
        job.status = JobStatus::Running;
        job.record("migration started");
        self.store.put(&job).await?;

        let outcome = self.execute(&mut job, source, target, &cancel).await;
        match outcome {
            Ok(()) => {
                job.advance(Phase::Completed);
                info!(job = %job.id, rows = job.stats.rows_migrated, "migration completed");
            }
            Err(err) => {
                error!(job = %job.id, error = %err, "migration failed");
                job.fail(err.to_string());
            }
        }

        // Cleanup is unconditional. A disconnect failure is logged and
        // swallowed, the job outcome is already decided.
        for (side, conn) in [("source", source), ("target", target)] {
            if let Err(err) = conn.disconnect().await {
                warn!(job = %job.id, side, error = %err, "disconnect failed");
            }
        }

        self.store.put(&job).await?;
        Ok(job)
    }

    async fn execute(
        &self,
        job: &mut MigrationJob,
        source: &dyn Connector,
        target: &dyn Connector,
        cancel: &watch::Receiver<bool>,
    ) -> Result<()> {
        if job.request.batch_size == 0 {
            return Err(MigrateError::Config("batch_size must be at least 1".into()));
        }
        let op_timeout = job.request.op_timeout();

        with_timeout(op_timeout, "connect source", source.connect()).await?;
        with_timeout(op_timeout, "connect target", target.connect()).await?;

        // Phase: schema analysis. The job starts here, so this is a record,
        // not a transition.
        job.record("phase: schema_analysis");
        let universe = with_timeout(op_timeout, "list_tables", source.list_tables()).await?;
        job.tables = select_tables(&universe, &job.request.tables, &job.request.exclude_tables);
        job.record(format!(
            "selected {} of {} tables",
            job.tables.len(),
            universe.len()
        ));
        self.store.put(job).await?;

        job.advance(Phase::TypeConversion);
        self.store.put(job).await?;
        let mut translated: Vec<(String, TableSchema)> = Vec::with_capacity(job.tables.len());
        for table in job.tables.clone() {
            check_cancel(cancel)?;
            job.current_table = Some(table.clone());

            let schema =
                with_timeout(op_timeout, "table_schema", source.table_schema(&table)).await?;
            job.stats.stored_procedures += schema.procedures.len() as u64;

            let translation = translate(&schema)?;
            for warning in &translation.warnings {
                warn!(job = %job.id, table = %table, warning = %warning, "translation warning");
                job.record(format!("warning: {}", warning));
            }

            with_timeout(
                op_timeout,
                "create_table",
                target.create_table(&translation.schema),
            )
            .await?;

            job.stats.tables_processed += 1;
            job.stats.schema_conversions += 1;
            job.stats.type_conversions += translation.columns_mapped as u64;
            job.record(format!(
                "converted {} ({} columns)",
                table, translation.columns_mapped
            ));
            self.store.put(job).await?;

            translated.push((table, translation.schema));
        }
        job.current_table = None;

        job.advance(Phase::DataMigration);
        self.store.put(job).await?;
        if job.request.only_schema {
            job.record("schema-only run, skipping data migration");
            self.store.put(job).await?;
        } else {
            let engine = TransferEngine::new(job.request.batch_size, op_timeout)?;
            for (table, target_schema) in &translated {
                check_cancel(cancel)?;
                job.current_table = Some(table.clone());

                let stats = {
                    let mut sink = TargetSink {
                        target,
                        job,
                        store: self.store.as_ref(),
                        op_timeout,
                    };
                    engine
                        .transfer(source, table, target_schema, &mut sink, Some(cancel))
                        .await?
                };

                job.record(format!(
                    "migrated {}: {} rows in {} batches",
                    table, stats.rows_written, stats.batches
                ));
                self.store.put(job).await?;
            }
            job.current_table = None;
        }

        job.advance(Phase::ProcedureConversion);
        self.store.put(job).await?;
        self.procedure_hook.run(job, source, target).await?;

        job.advance(Phase::Validation);
        self.store.put(job).await?;
        self.validation_hook.run(job, source, target).await?;

        Ok(())
    }
}

/// Apply include/exclude selection to the source's table universe.
///
/// An include list keeps its own order but only names the source actually
/// has; the exclude list always wins. Membership is case-sensitive and
/// absent names are silently ignored.
fn select_tables(universe: &[String], include: &[String], exclude: &[String]) -> Vec<String> {
    let base: Vec<String> = if include.is_empty() {
        universe.to_vec()
    } else {
        include
            .iter()
            .filter(|t| universe.contains(t))
            .cloned()
            .collect()
    };
    base.into_iter()
        .filter(|t| !exclude.contains(t))
        .collect()
}

fn check_cancel(cancel: &watch::Receiver<bool>) -> Result<()> {
    if *cancel.borrow() {
        return Err(MigrateError::Cancelled);
    }
    Ok(())
}

/// Sink that writes batches to the target connector and publishes the job
/// after each one.
struct TargetSink<'a, S: JobStore> {
    target: &'a dyn Connector,
    job: &'a mut MigrationJob,
    store: &'a S,
    op_timeout: std::time::Duration,
}

#[async_trait]
impl<S: JobStore> BatchSink for TargetSink<'_, S> {
    async fn accept(&mut self, table: &str, rows: Vec<Row>) -> Result<u64> {
        let accepted = with_timeout(
            self.op_timeout,
            "insert_rows",
            self.target.insert_rows(table, rows),
        )
        .await?;
        self.job.stats.rows_migrated += accepted;
        Ok(accepted)
    }

    async fn progress(&mut self, progress: &TableProgress) -> Result<()> {
        self.job.progress = Some(progress.clone());
        self.store.put(self.job).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_include_selects_whole_universe() {
        let selected = select_tables(&names(&["A", "B"]), &[], &[]);
        assert_eq!(selected, names(&["A", "B"]));
    }

    #[test]
    fn test_include_keeps_its_own_order_and_drops_unknown_names() {
        let selected = select_tables(&names(&["A", "B", "C"]), &names(&["C", "X", "A"]), &[]);
        assert_eq!(selected, names(&["C", "A"]));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let selected = select_tables(&names(&["A", "B"]), &names(&["A", "B"]), &names(&["B"]));
        assert_eq!(selected, names(&["A"]));
    }

    #[test]
    fn test_absent_exclude_name_is_a_noop() {
        let selected = select_tables(&names(&["A", "B"]), &[], &names(&["NOPE"]));
        assert_eq!(selected, names(&["A", "B"]));
    }

    #[test]
    fn test_exclusion_is_case_sensitive() {
        let selected = select_tables(&names(&["Orders"]), &[], &names(&["ORDERS"]));
        assert_eq!(selected, names(&["Orders"]));
    }
}
