//! Custom error types for job synchronisation.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid job name: {0:?}")]
    InvalidJobName(String),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// True for failures talking to the CI server, as opposed to local ones.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SyncError::Http(_)
                | SyncError::UnexpectedStatus { .. }
                | SyncError::Serialization(_)
                | SyncError::InvalidUrl(_)
        )
    }

    /// Map an I/O error on `path`, keeping a missing file distinct from other failures.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            SyncError::NotFound(path.into())
        } else {
            SyncError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
