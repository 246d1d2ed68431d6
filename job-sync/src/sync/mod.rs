//! Job synchronisation between the CI server and the local backup directory.
//!
//! Both directions fan out one tokio task per job and join every task
//! before producing a [`BatchReport`]; a failure in one job never stops
//! the others.

pub mod backup;
pub mod reconcile;

pub use backup::BackupOrchestrator;
pub use reconcile::ReconciliationEngine;

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// What reconciliation does with a job, decided by probing the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// No job with this name exists remotely
    Create,
    /// The job exists remotely and will be overwritten
    Update,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Create => f.write_str("create"),
            Strategy::Update => f.write_str("update"),
        }
    }
}

/// Result of processing one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub job: String,
    /// `None` for backups, and for reconciliations that failed before classification
    pub strategy: Option<Strategy>,
    /// Failure reason; `None` on success
    pub error: Option<String>,
}

impl JobOutcome {
    pub fn succeeded(job: impl Into<String>, strategy: Option<Strategy>) -> Self {
        Self {
            job: job.into(),
            strategy,
            error: None,
        }
    }

    pub fn failed(job: impl Into<String>, strategy: Option<Strategy>, error: impl fmt::Display) -> Self {
        Self {
            job: job.into(),
            strategy,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(strategy) = self.strategy {
            write!(f, "{}: ", strategy)?;
        }
        match &self.error {
            None => write!(f, "{}", self.job),
            Some(error) => write!(f, "{} FAILED ({})", self.job, error),
        }
    }
}

/// Every outcome of one run, ordered by job name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn new(mut outcomes: Vec<JobOutcome>) -> Self {
        outcomes.sort_by(|a, b| a.job.cmp(&b.job));
        Self { outcomes }
    }

    /// Overall verdict: true iff every job succeeded (vacuously true when empty).
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(JobOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn count(&self, strategy: Strategy) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.strategy == Some(strategy))
            .count()
    }

    pub fn get(&self, job: &str) -> Option<&JobOutcome> {
        self.outcomes.iter().find(|o| o.job == job)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Spawn `task` once per job, with at most `max_concurrent` running at a
/// time, and wait for every one of them.
///
/// Completion is the join of all handles, so the report always holds
/// exactly one outcome per input job whatever order the tasks finish in.
pub(crate) async fn run_per_job<T, F, Fut>(
    jobs: Vec<(String, T)>,
    max_concurrent: usize,
    task: F,
) -> BatchReport
where
    T: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = JobOutcome> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut handles = Vec::with_capacity(jobs.len());

    for (name, item) in jobs {
        let sem = Arc::clone(&semaphore);
        let job_future = task(item);

        let handle = tokio::spawn(async move {
            // The semaphore is never closed, so this only waits for a free slot.
            let _permit = sem.acquire_owned().await.ok();
            job_future.await
        });

        handles.push((name, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                warn!("Task for job {} did not complete: {}", name, e);
                outcomes.push(JobOutcome::failed(name, None, format!("task aborted: {}", e)));
            }
        }
    }

    BatchReport::new(outcomes)
}
