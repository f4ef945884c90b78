//! Batched row transfer for one table.
//!
//! The engine owns paging, transformation, progress accounting, timeouts,
//! and cancellation. What happens to the transformed rows is behind the
//! [`BatchSink`] seam, the orchestrator supplies a sink that writes to the
//! target connector and publishes job snapshots.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::connector::{with_timeout, Connector};
use crate::error::{MigrateError, Result};
use crate::job::TableProgress;
use crate::schema::TableSchema;
use crate::transform::transform_batch;
use crate::value::Row;

/// Receives transformed batches and progress updates.
#[async_trait]
pub trait BatchSink: Send {
    /// Accept one batch. Returns the number of rows durably accepted; an
    /// error means the batch was not committed at all.
    async fn accept(&mut self, table: &str, rows: Vec<Row>) -> Result<u64>;

    /// Observe progress after a committed batch (and once for empty tables).
    async fn progress(&mut self, progress: &TableProgress) -> Result<()>;
}

/// Outcome of a single-table transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub rows_read: u64,
    pub rows_written: u64,
    pub batches: u64,
}

/// Pages rows out of a source connector and feeds a sink.
pub struct TransferEngine {
    batch_size: usize,
    op_timeout: Duration,
}

impl TransferEngine {
    pub fn new(batch_size: usize, op_timeout: Duration) -> Result<Self> {
        if batch_size == 0 {
            return Err(MigrateError::Config("batch_size must be at least 1".into()));
        }
        Ok(Self {
            batch_size,
            op_timeout,
        })
    }

    /// Copy every row of `source_table` into the sink, transformed to the
    /// target schema's shape. Stats reflect only committed batches.
    pub async fn transfer(
        &self,
        source: &dyn Connector,
        source_table: &str,
        target: &TableSchema,
        sink: &mut dyn BatchSink,
        cancel: Option<&watch::Receiver<bool>>,
    ) -> Result<TransferStats> {
        let mut stats = TransferStats::default();

        let total = with_timeout(
            self.op_timeout,
            "count_rows",
            source.count_rows(source_table),
        )
        .await?;

        if total == 0 {
            debug!(table = source_table, "table is empty, nothing to transfer");
            sink.progress(&TableProgress::new(&target.name, 0, 0)).await?;
            return Ok(stats);
        }

        let mut offset = 0u64;
        loop {
            if let Some(cancel) = cancel {
                if *cancel.borrow() {
                    return Err(MigrateError::Cancelled);
                }
            }

            let page = with_timeout(
                self.op_timeout,
                "fetch_rows",
                source.fetch_rows(source_table, self.batch_size, offset),
            )
            .await?;
            if page.is_empty() {
                break;
            }
            let fetched = page.len() as u64;

            let rows = transform_batch(page, target).await?;
            let accepted = sink.accept(&target.name, rows).await?;

            stats.rows_read += fetched;
            stats.rows_written += accepted;
            stats.batches += 1;
            offset += fetched;

            sink.progress(&TableProgress::new(&target.name, stats.rows_read, total))
                .await?;

            if stats.rows_read >= total {
                break;
            }
        }

        info!(
            table = source_table,
            rows = stats.rows_written,
            batches = stats.batches,
            "table transfer complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::memory::MemoryConnector;
    use crate::schema::{ColumnDefinition, Dialect};
    use crate::value::Value;

    struct CollectingSink {
        rows: Vec<Row>,
        progress: Vec<TableProgress>,
        accepts: u64,
        fail_accept_from: Option<u64>,
    }

    impl CollectingSink {
        fn new() -> Self {
            Self {
                rows: Vec::new(),
                progress: Vec::new(),
                accepts: 0,
                fail_accept_from: None,
            }
        }
    }

    #[async_trait]
    impl BatchSink for CollectingSink {
        async fn accept(&mut self, table: &str, rows: Vec<Row>) -> Result<u64> {
            let call = self.accepts;
            self.accepts += 1;
            if matches!(self.fail_accept_from, Some(from) if call >= from) {
                return Err(MigrateError::transfer(table, "sink rejected batch"));
            }
            let count = rows.len() as u64;
            self.rows.extend(rows);
            Ok(count)
        }

        async fn progress(&mut self, progress: &TableProgress) -> Result<()> {
            self.progress.push(progress.clone());
            Ok(())
        }
    }

    fn source_schema() -> TableSchema {
        TableSchema::new(
            "ITEMS",
            Dialect::Oracle,
            vec![ColumnDefinition::new("ID", "NUMBER")],
        )
    }

    fn target_schema() -> TableSchema {
        TableSchema::new(
            "items",
            Dialect::Postgres,
            vec![ColumnDefinition::new("id", "NUMBER")],
        )
    }

    fn seeded(n: i64) -> MemoryConnector {
        let rows = (0..n)
            .map(|i| Row::new().with("ID", Value::Int(i)))
            .collect();
        MemoryConnector::new(Dialect::Oracle).with_table(source_schema(), rows)
    }

    fn engine(batch: usize) -> TransferEngine {
        TransferEngine::new(batch, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_zero_batch_size_is_rejected() {
        assert!(TransferEngine::new(0, Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_every_row_transfers_exactly_once() {
        let source = seeded(10);
        source.connect().await.unwrap();
        let mut sink = CollectingSink::new();

        let stats = engine(3)
            .transfer(&source, "ITEMS", &target_schema(), &mut sink, None)
            .await
            .unwrap();

        assert_eq!(stats.rows_read, 10);
        assert_eq!(stats.rows_written, 10);
        assert_eq!(stats.batches, 4);
        let ids: Vec<i64> = sink
            .rows
            .iter()
            .map(|r| match r.get("id") {
                Some(Value::Int(i)) => *i,
                other => panic!("unexpected value: {:?}", other),
            })
            .collect();
        assert_eq!(ids, (0..10).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_progress_is_non_decreasing_and_ends_at_100() {
        let source = seeded(7);
        source.connect().await.unwrap();
        let mut sink = CollectingSink::new();

        engine(2)
            .transfer(&source, "ITEMS", &target_schema(), &mut sink, None)
            .await
            .unwrap();

        let pcts: Vec<u8> = sink.progress.iter().map(|p| p.percentage).collect();
        assert!(pcts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*pcts.last().unwrap(), 100);
    }

    #[tokio::test]
    async fn test_empty_table_reports_100_without_fetching() {
        let source = seeded(0);
        source.connect().await.unwrap();
        let mut sink = CollectingSink::new();

        let stats = engine(5)
            .transfer(&source, "ITEMS", &target_schema(), &mut sink, None)
            .await
            .unwrap();

        assert_eq!(stats, TransferStats::default());
        assert_eq!(sink.progress.len(), 1);
        assert_eq!(sink.progress[0].percentage, 100);
        assert_eq!(sink.progress[0].total_rows, 0);
    }

    #[tokio::test]
    async fn test_sink_failure_stops_transfer_with_committed_stats_only() {
        let source = seeded(10);
        source.connect().await.unwrap();
        let mut sink = CollectingSink::new();
        sink.fail_accept_from = Some(2);

        let err = engine(3)
            .transfer(&source, "ITEMS", &target_schema(), &mut sink, None)
            .await
            .unwrap_err();

        assert!(matches!(err, MigrateError::Transfer { .. }));
        // Two batches of three rows landed before the failing call.
        assert_eq!(sink.rows.len(), 6);
        assert_eq!(sink.progress.len(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_is_observed_between_batches() {
        let source = seeded(10);
        source.connect().await.unwrap();
        let mut sink = CollectingSink::new();

        let (tx, rx) = watch::channel(true);
        let _tx = tx;
        let err = engine(3)
            .transfer(&source, "ITEMS", &target_schema(), &mut sink, Some(&rx))
            .await
            .unwrap_err();

        assert!(matches!(err, MigrateError::Cancelled));
        assert!(sink.rows.is_empty());
    }
}
