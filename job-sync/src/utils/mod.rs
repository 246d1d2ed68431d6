//! Utility modules for job-sync.

pub mod errors;
pub mod logger;

pub use errors::{Result, SyncError};
