//! Command implementations behind the `job-sync` binary.
//!
//! Each command returns the run's verdict; fatal errors (bad listing,
//! missing backup directory) come back as `Err`.

use crate::config::Config;
use crate::fs::LocalStore;
use crate::sync::{BackupOrchestrator, BatchReport, ReconciliationEngine};
use crate::transport::ConfigTransport;
use std::sync::Arc;

/// Print the names of all jobs on the server.
pub async fn list(transport: Arc<dyn ConfigTransport>, json: bool) -> anyhow::Result<bool> {
    let jobs = transport.list_jobs().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
    } else {
        for job in &jobs {
            println!("{}", job.name);
        }
    }
    Ok(true)
}

/// Back up every remote job into the configured store.
pub async fn backup(transport: Arc<dyn ConfigTransport>, config: &Config, json: bool) -> anyhow::Result<bool> {
    let orchestrator = BackupOrchestrator::new(transport, LocalStore::new(&config.store.root), &config.sync);
    let report = orchestrator.backup_all().await?;
    print_report(&report, json)?;
    Ok(report.success())
}

/// Create or update remote jobs from the configured store.
pub async fn install(transport: Arc<dyn ConfigTransport>, config: &Config, json: bool) -> anyhow::Result<bool> {
    let engine = ReconciliationEngine::new(transport, LocalStore::new(&config.store.root), &config.sync);
    let report = engine.reconcile_all().await?;
    print_report(&report, json)?;
    Ok(report.success())
}

fn print_report(report: &BatchReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for outcome in &report.outcomes {
        println!("{}", outcome);
    }

    let failed = report.failures().count();
    if failed > 0 {
        println!("{} of {} jobs failed", failed, report.len());
    } else {
        println!("{} jobs ok", report.len());
    }
    Ok(())
}
