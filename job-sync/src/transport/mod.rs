//! Remote side of synchronisation: the CI server's job configurations.

pub mod http;
#[cfg(test)]
pub(crate) mod mock;

use crate::utils::{Result, SyncError};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub use http::HttpTransport;

/// A job as reported by the server's job listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteJob {
    pub name: String,

    /// Job URL as advertised by the server, if any
    #[serde(default)]
    pub url: Option<String>,
}

impl RemoteJob {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }
}

/// The remote primitives the sync engines are built on.
///
/// Errors returned here are per-call; callers decide whether they are
/// fatal (listing) or only fail a single job.
#[async_trait]
pub trait ConfigTransport: Send + Sync {
    /// Enumerate every job the server knows about.
    async fn list_jobs(&self) -> Result<Vec<RemoteJob>>;

    /// Fetch a job's configuration by name.
    /// Returns `None` when the server reports that the job does not exist.
    async fn fetch_config(&self, name: &str) -> Result<Option<Bytes>>;

    /// Fetch the configuration of a job taken from [`list_jobs`](Self::list_jobs).
    /// A job that vanished since the listing is an error here.
    async fn fetch_listed_config(&self, job: &RemoteJob) -> Result<Bytes> {
        self.fetch_config(&job.name)
            .await?
            .ok_or_else(|| SyncError::UnexpectedStatus {
                url: format!("job/{}/config.xml", job.name),
                status: 404,
            })
    }

    /// Create a new job. `Ok(false)` means the server refused it.
    async fn create_job(&self, name: &str, body: Bytes) -> Result<bool>;

    /// Overwrite an existing job's configuration. `Ok(false)` means the server refused it.
    async fn update_job(&self, name: &str, body: Bytes) -> Result<bool>;
}
