//! Push the local backup directory to the CI server.
//!
//! Every job is probed on the server first: a job that exists is updated in
//! place, a job that does not is created. The probe is never skipped, since
//! remote state may have moved since the backup was taken.

use super::{run_per_job, BatchReport, JobOutcome, Strategy};
use crate::config::SyncConfig;
use crate::fs::store::check_job_name;
use crate::fs::LocalStore;
use crate::transport::ConfigTransport;
use crate::utils::Result;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct ReconciliationEngine {
    transport: Arc<dyn ConfigTransport>,
    store: LocalStore,
    max_concurrent: usize,
}

impl ReconciliationEngine {
    pub fn new(transport: Arc<dyn ConfigTransport>, store: LocalStore, config: &SyncConfig) -> Self {
        Self {
            transport,
            store,
            max_concurrent: config.max_concurrent_jobs,
        }
    }

    /// Reconcile every job directory in the local store.
    ///
    /// Failing to list the store is fatal and returned as `Err`; anything
    /// that goes wrong afterwards only fails the job concerned.
    pub async fn reconcile_all(&self) -> Result<BatchReport> {
        let names = self.store.list_job_directories().await.map_err(|e| {
            error!("Failed to list job directories in {}: {}", self.store.root().display(), e);
            e
        })?;

        Ok(self.reconcile(names).await)
    }

    /// Reconcile the given jobs. Duplicate names are processed once.
    pub async fn reconcile(&self, names: impl IntoIterator<Item = String>) -> BatchReport {
        let names: BTreeSet<String> = names.into_iter().collect();
        info!("Reconciling {} jobs from {}", names.len(), self.store.root().display());

        let jobs = names.into_iter().map(|name| (name.clone(), name)).collect();
        let report = run_per_job(jobs, self.max_concurrent, |name| {
            reconcile_job(Arc::clone(&self.transport), self.store.clone(), name)
        })
        .await;

        info!(
            "Reconciliation finished: {} created, {} updated, {} failed",
            report.count(Strategy::Create) - failed_with(&report, Strategy::Create),
            report.count(Strategy::Update) - failed_with(&report, Strategy::Update),
            report.failures().count(),
        );
        report
    }
}

fn failed_with(report: &BatchReport, strategy: Strategy) -> usize {
    report
        .failures()
        .filter(|o| o.strategy == Some(strategy))
        .count()
}

/// Decide whether `name` must be created or updated.
///
/// Only a definite "found" or "not found" classifies the job; any other
/// answer from the server is an error.
pub async fn classify(transport: &dyn ConfigTransport, name: &str) -> Result<Strategy> {
    let strategy = match transport.fetch_config(name).await? {
        Some(_) => Strategy::Update,
        None => Strategy::Create,
    };
    Ok(strategy)
}

async fn reconcile_job(
    transport: Arc<dyn ConfigTransport>,
    store: LocalStore,
    name: String,
) -> JobOutcome {
    if let Err(e) = check_job_name(&name) {
        warn!("Refusing to reconcile job: {}", e);
        return JobOutcome::failed(name, None, e);
    }

    let strategy = match classify(transport.as_ref(), &name).await {
        Ok(strategy) => strategy,
        Err(e) => {
            warn!("Could not determine state of job {}: {}", name, e);
            return JobOutcome::failed(name, None, e);
        }
    };
    info!("{}: {}", strategy, name);

    let body = match store.read_config(&name).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to read configuration for job {}: {}", name, e);
            return JobOutcome::failed(name, Some(strategy), e);
        }
    };

    let acknowledged = match strategy {
        Strategy::Create => transport.create_job(&name, body).await,
        Strategy::Update => transport.update_job(&name, body).await,
    };

    match acknowledged {
        Ok(true) => JobOutcome::succeeded(name, Some(strategy)),
        Ok(false) => {
            warn!("Server did not acknowledge {} of job {}", strategy, name);
            JobOutcome::failed(name, Some(strategy), format!("server did not acknowledge {}", strategy))
        }
        Err(e) => {
            warn!("Failed to {} job {}: {}", strategy, name, e);
            JobOutcome::failed(name, Some(strategy), e)
        }
    }
}
