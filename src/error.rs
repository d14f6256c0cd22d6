//! Unified error handling
//!
//! Domain-specific errors stay where they are defined; this module wraps
//! them in a single [`Error`] enum for use across module boundaries, with
//! an [`ErrorCategory`] classification matching the engine's error-handling
//! taxonomy: configuration problems are surfaced and mutate nothing,
//! transient tab failures are recovered mid-cycle, validation failures are
//! rejected at the boundary, and storage failures propagate as failed
//! responses. Nothing here is fatal to the process.

use std::io;
use thiserror::Error;

pub use crate::host::HostError;
pub use crate::models::ValidationError;
pub use crate::scheduler::SchedulerError;
pub use crate::storage::{ImportError, StorageError};

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad configuration (empty URL list, malformed import)
    Configuration,
    /// Boundary validation failures (bad URL, bad time, duplicate rule)
    Validation,
    /// Transient tab operation failures
    Tab,
    /// Settings persistence failures
    Storage,
    /// Scheduler failures not covered above
    Scheduler,
    /// Everything else
    Other,
}

/// Unified error type
#[derive(Debug, Error)]
pub enum Error {
    /// Scheduler errors (start/tick failures)
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Boundary validation errors
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Import errors
    #[error("import error: {0}")]
    Import(#[from] ImportError),

    /// Settings persistence errors
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Tab host errors
    #[error("tab host error: {0}")]
    Host(#[from] HostError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error category for handling strategies.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Scheduler(SchedulerError::NoUrlsConfigured) => ErrorCategory::Configuration,
            Self::Scheduler(SchedulerError::Tab(_)) => ErrorCategory::Tab,
            Self::Scheduler(SchedulerError::Store(_)) => ErrorCategory::Storage,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Import(ImportError::Invalid(_)) => ErrorCategory::Validation,
            Self::Import(_) => ErrorCategory::Configuration,
            Self::Storage(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Host(_) => ErrorCategory::Tab,
            Self::Json(_) => ErrorCategory::Other,
            Self::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Check if this error is recoverable (the cycle can continue).
    pub fn is_recoverable(&self) -> bool {
        matches!(self.category(), ErrorCategory::Tab)
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
