use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::OptimizationEngine;
use crate::domain::OptimizationRecord;
use crate::error::{GridError, GridResult};

/// Finished jobs are forgotten once this many jobs are tracked.
const MAX_TRACKED_JOBS: usize = 1024;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed { record: OptimizationRecord },
    Failed { error: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub task_id: Uuid,
    pub region: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: JobStatus,
}

/// Returned by [`AsyncDispatcher::submit`]. Dropping it detaches the job,
/// which still runs to completion.
pub struct JobHandle {
    pub task_id: Uuid,
    join: JoinHandle<GridResult<OptimizationRecord>>,
}

impl JobHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Runs engine invocations off the caller's path, one tokio task per job.
/// No priority, cancellation or retry.
#[derive(Clone)]
pub struct AsyncDispatcher {
    engine: Arc<OptimizationEngine>,
    jobs: Arc<RwLock<HashMap<Uuid, JobInfo>>>,
}

impl AsyncDispatcher {
    pub fn new(engine: Arc<OptimizationEngine>) -> Self {
        Self {
            engine,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn submit(&self, region: Option<String>) -> JobHandle {
        let task_id = Uuid::new_v4();
        {
            let mut jobs = self.jobs.write();
            if jobs.len() >= MAX_TRACKED_JOBS {
                jobs.retain(|_, job| !job.status.is_finished());
            }
            jobs.insert(
                task_id,
                JobInfo {
                    task_id,
                    region: region.clone(),
                    submitted_at: Utc::now(),
                    status: JobStatus::Running,
                },
            );
        }
        info!(%task_id, region = region.as_deref().unwrap_or("*"), "background optimization started");

        let engine = self.engine.clone();
        let jobs = self.jobs.clone();
        let join = tokio::spawn(async move {
            let result = engine.optimize(region.as_deref()).await;
            let status = match &result {
                Ok(record) => {
                    info!(%task_id, region = %record.region, losses = record.losses, "background optimization completed");
                    JobStatus::Completed {
                        record: record.clone(),
                    }
                }
                Err(e) => {
                    warn!(%task_id, error = %e, "background optimization failed");
                    JobStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            if let Some(job) = jobs.write().get_mut(&task_id) {
                job.status = status;
            }
            result
        });

        JobHandle { task_id, join }
    }

    pub async fn wait(&self, handle: JobHandle) -> GridResult<OptimizationRecord> {
        match handle.join.await {
            Ok(result) => result,
            Err(e) => {
                let message = format!("job {} aborted: {}", handle.task_id, e);
                if let Some(job) = self.jobs.write().get_mut(&handle.task_id) {
                    job.status = JobStatus::Failed {
                        error: message.clone(),
                    };
                }
                Err(GridError::JobAborted(message))
            }
        }
    }

    /// Current state of a job; `Running` until the engine call returns.
    pub fn status(&self, task_id: &Uuid) -> Option<JobInfo> {
        self.jobs.read().get(task_id).cloned()
    }
}
