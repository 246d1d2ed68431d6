//! job-sync library
//!
//! Backs up CI server job configurations into a local directory and
//! installs them back, creating or updating each job as needed.

pub mod commands;
pub mod config;
pub mod fs;
pub mod sync;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use fs::LocalStore;
pub use sync::{BackupOrchestrator, BatchReport, JobOutcome, ReconciliationEngine, Strategy};
pub use transport::{ConfigTransport, HttpTransport, RemoteJob};
pub use utils::errors::SyncError;
pub type Result<T> = std::result::Result<T, SyncError>;
