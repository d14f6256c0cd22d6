//! zoetrope - Dashboard tab rotation engine
//!
//! Opens a configured list of URLs as background tabs on a pluggable tab
//! host, cycles focus among them on a two-tier timer, reloads each tab on
//! visit, and swaps URLs by time of day.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Runtime configuration (paths, logging, notifications)
//! - [`models`] - The settings record, time rules, and validation
//! - [`rules`] - Time-of-day URL substitution
//! - [`host`] - Tab host trait and the simulated implementation
//! - [`scheduler`] - The rotation cycle: timers, recovery, cleanup
//! - [`storage`] - Settings persistence, import, and export
//! - [`router`] - Command dispatch for UI surfaces
//! - [`notify`] - User-visible notices and delivery channels
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zoetrope::host::SimulatedHost;
//! use zoetrope::notify::NotificationHub;
//! use zoetrope::scheduler::RotationScheduler;
//! use zoetrope::storage::SettingsStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let host = Arc::new(SimulatedHost::new());
//!     let store = Arc::new(SettingsStore::with_file("data/settings.json"));
//!     let scheduler = RotationScheduler::new(host, store, Arc::new(NotificationHub::new()));
//!     scheduler.spawn_removal_listener();
//!     // scheduler.start().await?;
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod models;
pub mod notify;
pub mod router;
pub mod rules;
pub mod scheduler;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::host::{SimulatedHost, TabHost, TabId};
    pub use crate::models::{Settings, TimeOfDay, TimeRule};
    pub use crate::notify::{Notice, NotificationHub};
    pub use crate::router::{Command, Response, Router};
    pub use crate::rules::RuleSet;
    pub use crate::scheduler::{RotationScheduler, RotationStatus};
    pub use crate::storage::SettingsStore;
}

// Direct re-exports for convenience
pub use models::{Settings, TimeOfDay, TimeRule};
