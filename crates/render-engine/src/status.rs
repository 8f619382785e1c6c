//! Job status reporting.
//!
//! The renderer writes a [`JobStatus`] at each checkpoint. Writes are
//! fire-and-forget: a sink must never fail or block the job.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use beatcut_common::RenderError;
use beatcut_project_model::{JobState, RenderOutput};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub job_id: Uuid,

    pub state: JobState,

    /// Percentage at the last checkpoint.
    pub progress: u8,

    /// Set once the job completed.
    pub output: Option<RenderOutput>,

    /// Set once the job failed.
    pub error: Option<RenderError>,

    pub updated_at: DateTime<Utc>,
}

impl JobStatus {
    pub fn new(job_id: Uuid, state: JobState, progress: u8) -> Self {
        Self {
            job_id,
            state,
            progress,
            output: None,
            error: None,
            updated_at: Utc::now(),
        }
    }
}

/// Receives status writes.
pub trait StatusSink: Send + Sync {
    fn update(&self, status: JobStatus);
}

/// Writes status changes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl StatusSink for LoggingSink {
    fn update(&self, status: JobStatus) {
        match &status.error {
            Some(err) => tracing::error!(
                job_id = %status.job_id,
                state = %status.state,
                stage = %err.stage,
                error = %err.message,
                "Job status"
            ),
            None => tracing::info!(
                job_id = %status.job_id,
                state = %status.state,
                progress = status.progress,
                "Job status"
            ),
        }
    }
}

/// In-memory latest-status table.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    jobs: Mutex<HashMap<Uuid, JobStatus>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, job_id: &Uuid) -> Option<JobStatus> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .cloned()
    }

    /// All known jobs, oldest update first.
    pub fn snapshot(&self) -> Vec<JobStatus> {
        let mut all: Vec<JobStatus> = self
            .jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by_key(|s| s.updated_at);
        all
    }
}

impl StatusSink for StatusRegistry {
    fn update(&self, status: JobStatus) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(status.job_id, status);
    }
}

/// Forwards every write to several sinks.
pub struct FanoutSink {
    sinks: Vec<std::sync::Arc<dyn StatusSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<std::sync::Arc<dyn StatusSink>>) -> Self {
        Self { sinks }
    }
}

impl StatusSink for FanoutSink {
    fn update(&self, status: JobStatus) {
        for sink in &self.sinks {
            sink.update(status.clone());
        }
    }
}
