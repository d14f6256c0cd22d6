//! Error types for the scheduler module

use thiserror::Error;

use crate::host::HostError;
use crate::storage::StorageError;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Start was requested with an empty URL list
    #[error("no URLs configured; add at least one URL before starting")]
    NoUrlsConfigured,

    /// A tab operation failed
    #[error("tab operation failed: {0}")]
    Tab(#[from] HostError),

    /// Settings could not be read at start
    #[error("settings could not be loaded: {0}")]
    Store(#[from] StorageError),
}

impl SchedulerError {
    /// Whether the rotation cycle can continue past this error.
    ///
    /// Tab failures are transient (the tab may have been closed between
    /// ticks); configuration and storage failures are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Tab(_))
    }
}
