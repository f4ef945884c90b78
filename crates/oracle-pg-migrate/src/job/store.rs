//! Job persistence seam.
//!
//! The orchestrator only ever publishes whole [`MigrationJob`] snapshots, so
//! a store implementation needs nothing beyond atomic replace-by-id. The
//! in-memory store below is the default backing; durable backends implement
//! the same trait outside this crate.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;

use super::{JobStatus, MigrationJob, Phase};

/// Reduced listing shape, enough for an index view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub status: JobStatus,
    pub phase: Phase,
    pub current_table: Option<String>,
}

impl From<&MigrationJob> for JobSummary {
    fn from(job: &MigrationJob) -> Self {
        Self {
            id: job.id.clone(),
            status: job.status,
            phase: job.phase,
            current_table: job.current_table.clone(),
        }
    }
}

/// Storage for job snapshots, keyed by job id.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or replace the record for `job.id` as one atomic step.
    async fn put(&self, job: &MigrationJob) -> Result<()>;

    async fn get(&self, id: &str) -> Result<Option<MigrationJob>>;

    async fn list(&self) -> Result<Vec<JobSummary>>;
}

/// Process-local [`JobStore`] over a `RwLock`ed map.
#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, MigrationJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn put(&self, job: &MigrationJob) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<MigrationJob>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<JobSummary>> {
        let jobs = self.jobs.read().await;
        let mut summaries: Vec<JobSummary> = jobs.values().map(JobSummary::from).collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }
}
