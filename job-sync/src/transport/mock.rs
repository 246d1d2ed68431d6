//! In-memory transport for engine tests.

use super::{ConfigTransport, RemoteJob};
use crate::utils::{Result, SyncError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct MockState {
    jobs: BTreeMap<String, Bytes>,
    failing_listing: bool,
    failing_fetches: HashSet<String>,
    rejected_writes: HashSet<String>,
    failing_writes: HashSet<String>,
    delays: HashMap<String, Duration>,
    fetches: HashMap<String, usize>,
    writes: HashMap<String, usize>,
}

/// Fake CI server keeping job configurations in a map.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: &[(&str, &str)]) -> Self {
        let transport = Self::new();
        {
            let mut state = transport.state.lock().unwrap();
            for (name, body) in jobs {
                state.jobs.insert(name.to_string(), Bytes::from(body.to_string()));
            }
        }
        transport
    }

    pub fn config(&self, name: &str) -> Option<Bytes> {
        self.state.lock().unwrap().jobs.get(name).cloned()
    }

    pub fn job_names(&self) -> Vec<String> {
        self.state.lock().unwrap().jobs.keys().cloned().collect()
    }

    pub fn fail_listing(&self) {
        self.state.lock().unwrap().failing_listing = true;
    }

    /// Make every GET of `name` fail with a server error.
    pub fn fail_fetch(&self, name: &str) {
        self.state.lock().unwrap().failing_fetches.insert(name.to_string());
    }

    /// Make create/update of `name` return a non-200 answer.
    pub fn reject_writes(&self, name: &str) {
        self.state.lock().unwrap().rejected_writes.insert(name.to_string());
    }

    /// Make create/update of `name` fail with a transport error.
    pub fn fail_writes(&self, name: &str) {
        self.state.lock().unwrap().failing_writes.insert(name.to_string());
    }

    /// Delay every GET of `name`.
    pub fn delay(&self, name: &str, delay: Duration) {
        self.state.lock().unwrap().delays.insert(name.to_string(), delay);
    }

    pub fn fetch_count(&self, name: &str) -> usize {
        self.state.lock().unwrap().fetches.get(name).copied().unwrap_or(0)
    }

    pub fn write_count(&self, name: &str) -> usize {
        self.state.lock().unwrap().writes.get(name).copied().unwrap_or(0)
    }

    fn write(&self, name: &str, body: Bytes) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        *state.writes.entry(name.to_string()).or_default() += 1;
        if state.failing_writes.contains(name) {
            return Err(SyncError::UnexpectedStatus {
                url: format!("mock/job/{}", name),
                status: 502,
            });
        }
        if state.rejected_writes.contains(name) {
            return Ok(false);
        }
        state.jobs.insert(name.to_string(), body);
        Ok(true)
    }
}

#[async_trait]
impl ConfigTransport for MockTransport {
    async fn list_jobs(&self) -> Result<Vec<RemoteJob>> {
        let state = self.state.lock().unwrap();
        if state.failing_listing {
            return Err(SyncError::UnexpectedStatus {
                url: "mock/api/json".to_string(),
                status: 500,
            });
        }
        Ok(state.jobs.keys().map(RemoteJob::new).collect())
    }

    async fn fetch_config(&self, name: &str) -> Result<Option<Bytes>> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            *state.fetches.entry(name.to_string()).or_default() += 1;
            state.delays.get(name).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock().unwrap();
        if state.failing_fetches.contains(name) {
            return Err(SyncError::UnexpectedStatus {
                url: format!("mock/job/{}/config.xml", name),
                status: 503,
            });
        }
        Ok(state.jobs.get(name).cloned())
    }

    async fn create_job(&self, name: &str, body: Bytes) -> Result<bool> {
        if self.config(name).is_some() {
            // Jenkins answers createItem for an existing job with 400.
            return Ok(false);
        }
        self.write(name, body)
    }

    async fn update_job(&self, name: &str, body: Bytes) -> Result<bool> {
        if self.config(name).is_none() {
            return Ok(false);
        }
        self.write(name, body)
    }
}
