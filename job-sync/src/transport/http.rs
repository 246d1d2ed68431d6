//! HTTP implementation of [`ConfigTransport`] for Jenkins-style servers.
//!
//! Endpoints, relative to the configured base URL:
//! - `GET  api/json`                 job listing (`{"jobs": [{"name", "url"}]}`)
//! - `GET  job/<name>/config.xml`    job configuration
//! - `POST createItem?name=<name>`   create a job from an XML body
//! - `POST job/<name>/config.xml`    replace a job's configuration (raw body)

use super::{ConfigTransport, RemoteJob};
use crate::config::Config;
use crate::utils::{Result, SyncError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

/// Sent with `createItem` only; config updates post the raw body.
const XML_CONTENT_TYPE: &str = "text/xml";

#[derive(Debug, Deserialize)]
struct JobListing {
    jobs: Vec<RemoteJob>,
}

/// Talks to the CI server over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
    credentials: Option<(String, String)>,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.server.url)
            .map_err(|e| SyncError::InvalidUrl(format!("{}: {}", config.server.url, e)))?;
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base,
            credentials: config
                .credentials()
                .map(|(user, token)| (user.to_string(), token.to_string())),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| SyncError::InvalidUrl(self.base.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn job_config_url(&self, name: &str) -> Result<Url> {
        self.endpoint(&["job", name, "config.xml"])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{} {}", method, url);
        let request = self.client.request(method, url);
        match &self.credentials {
            Some((user, token)) => request.basic_auth(user, Some(token)),
            None => request,
        }
    }

    /// GET a configuration document. Only a 200 counts as found.
    async fn get_config(&self, url: Url) -> Result<Option<Bytes>> {
        let response = self.request(Method::GET, url.clone()).send().await?;
        match response.status() {
            StatusCode::OK => Ok(Some(response.bytes().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(SyncError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }
}

#[async_trait]
impl ConfigTransport for HttpTransport {
    async fn list_jobs(&self) -> Result<Vec<RemoteJob>> {
        let url = self.endpoint(&["api", "json"])?;
        let response = self.request(Method::GET, url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let listing: JobListing = serde_json::from_slice(&body)?;
        Ok(listing.jobs)
    }

    async fn fetch_config(&self, name: &str) -> Result<Option<Bytes>> {
        let url = self.job_config_url(name)?;
        self.get_config(url).await
    }

    async fn fetch_listed_config(&self, job: &RemoteJob) -> Result<Bytes> {
        let url = match &job.url {
            Some(job_url) => {
                let raw = format!("{}/config.xml", job_url.trim_end_matches('/'));
                Url::parse(&raw).map_err(|e| SyncError::InvalidUrl(format!("{}: {}", raw, e)))?
            }
            None => self.job_config_url(&job.name)?,
        };

        self.get_config(url.clone())
            .await?
            .ok_or_else(|| SyncError::UnexpectedStatus {
                url: url.to_string(),
                status: StatusCode::NOT_FOUND.as_u16(),
            })
    }

    async fn create_job(&self, name: &str, body: Bytes) -> Result<bool> {
        let url = self.endpoint(&["createItem"])?;
        let response = self
            .request(Method::POST, url)
            .query(&[("name", name)])
            .header(CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        debug!("createItem {} -> {}", name, response.status());
        Ok(response.status() == StatusCode::OK)
    }

    async fn update_job(&self, name: &str, body: Bytes) -> Result<bool> {
        let url = self.job_config_url(name)?;
        let response = self
            .request(Method::POST, url)
            .body(body)
            .send()
            .await?;

        debug!("update {} -> {}", name, response.status());
        Ok(response.status() == StatusCode::OK)
    }
}
