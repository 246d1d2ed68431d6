//! Pull every job configuration from the CI server into the local store.

use super::{run_per_job, BatchReport, JobOutcome};
use crate::config::SyncConfig;
use crate::fs::LocalStore;
use crate::transport::{ConfigTransport, RemoteJob};
use crate::utils::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct BackupOrchestrator {
    transport: Arc<dyn ConfigTransport>,
    store: LocalStore,
    max_concurrent: usize,
}

impl BackupOrchestrator {
    pub fn new(transport: Arc<dyn ConfigTransport>, store: LocalStore, config: &SyncConfig) -> Self {
        Self {
            transport,
            store,
            max_concurrent: config.max_concurrent_jobs,
        }
    }

    /// Mirror all remote jobs into the local store.
    ///
    /// A failed job listing aborts the run with `Err`. Fetch or write
    /// failures only fail the job concerned.
    pub async fn backup_all(&self) -> Result<BatchReport> {
        let jobs = self.transport.list_jobs().await.map_err(|e| {
            error!("Failed to list remote jobs: {}", e);
            e
        })?;

        info!("Backing up {} jobs to {}", jobs.len(), self.store.root().display());

        let jobs = jobs.into_iter().map(|job| (job.name.clone(), job)).collect();
        let report = run_per_job(jobs, self.max_concurrent, |job| {
            backup_job(Arc::clone(&self.transport), self.store.clone(), job)
        })
        .await;

        info!(
            "Backup finished: {} written, {} failed",
            report.len() - report.failures().count(),
            report.failures().count()
        );
        Ok(report)
    }
}

async fn backup_job(transport: Arc<dyn ConfigTransport>, store: LocalStore, job: RemoteJob) -> JobOutcome {
    if job.name.contains('.') {
        warn!("Job {} contains '.', its backup will not be picked up for restore", job.name);
    }

    let body = match transport.fetch_listed_config(&job).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to fetch configuration for job {}: {}", job.name, e);
            return JobOutcome::failed(job.name, None, e);
        }
    };

    match store.write_config(&job.name, &body).await {
        Ok(path) => {
            info!("created file: {}", path.display());
            JobOutcome::succeeded(job.name, None)
        }
        Err(e) => {
            warn!("Failed to write configuration for job {}: {}", job.name, e);
            JobOutcome::failed(job.name, None, e)
        }
    }
}
