//! Tab rotation scheduling
//!
//! The scheduler cycles focus through a list of managed tabs on a two-tier
//! timer: a short wait between tabs within a lap and a long wait once every
//! tab has been shown. Each visit refocuses the tab, waits briefly, resyncs
//! the URL against the time rules, and reloads. Transient tab failures skip
//! ahead instead of aborting the cycle; externally closed tabs are dropped
//! from the rotation, and the cycle stops itself when none remain.
//!
//! # Modules
//!
//! - [`rotation`] - The scheduler itself: state machine, timers, recovery
//! - [`error`] - Scheduler-specific error types

pub mod error;
pub mod rotation;

pub use error::{SchedulerError, SchedulerResult};
pub use rotation::{
    RotationEvent, RotationScheduler, RotationStatus, StartOutcome, Timing,
};
