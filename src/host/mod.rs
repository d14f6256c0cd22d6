//! Host platform surfaces
//!
//! The rotation engine never talks to a browser directly; it drives tabs
//! through the [`TabHost`] trait. Implement the trait to plug in a real
//! browser (WebDriver, extension native messaging); the crate ships a
//! [`sim::SimulatedHost`] used by the CLI and the test suite.

pub mod sim;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use sim::{HostAction, SimulatedHost};

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Errors surfaced by a tab host
///
/// These are the transient failures the scheduler recovers from mid-cycle.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    /// The tab no longer exists (closed, crashed, or never created)
    #[error("tab {tab} not found")]
    TabNotFound { tab: TabId },

    /// The underlying platform rejected the operation
    #[error("host backend error: {0}")]
    Backend(String),
}

/// Opaque handle for a tab owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tab management surface
///
/// All operations are asynchronous; implementations must be safe to share
/// across tasks. [`TabHost::removals`] yields tabs closed *externally*
/// (by the user or the platform); closes issued through [`TabHost::close`]
/// are not reported back.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// Open a tab at `url`. `focused` selects foreground vs background.
    async fn open(&self, url: &str, focused: bool) -> HostResult<TabId>;

    /// Bring a tab to the foreground.
    async fn activate(&self, tab: TabId) -> HostResult<()>;

    /// Navigate a tab to a new URL.
    async fn navigate(&self, tab: TabId, url: &str) -> HostResult<()>;

    /// Reload a tab in place.
    async fn reload(&self, tab: TabId) -> HostResult<()>;

    /// Close a tab.
    async fn close(&self, tab: TabId) -> HostResult<()>;

    /// The URL the tab currently displays (may differ from what was opened,
    /// e.g. after a redirect).
    async fn current_url(&self, tab: TabId) -> HostResult<String>;

    /// Subscribe to externally-initiated tab removals.
    fn removals(&self) -> broadcast::Receiver<TabId>;
}
