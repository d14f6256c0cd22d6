//! In-memory tab host
//!
//! Backs the CLI's `run` command and the test suite. Tabs are plain records;
//! every operation is logged so tests can assert on the exact sequence the
//! scheduler performed. Failures can be injected per tab to exercise the
//! degraded-continuation path.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use super::{HostError, HostResult, TabHost, TabId};

const REMOVAL_CHANNEL_CAPACITY: usize = 64;

/// One recorded host operation, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    Opened { tab: TabId, url: String, focused: bool },
    Activated { tab: TabId },
    Navigated { tab: TabId, url: String },
    Reloaded { tab: TabId },
    Closed { tab: TabId },
}

#[derive(Debug, Default)]
struct SimState {
    tabs: BTreeMap<TabId, String>,
    focused: Option<TabId>,
    actions: Vec<HostAction>,
    failing: HashSet<TabId>,
}

/// Simulated tab host with operation recording and failure injection
pub struct SimulatedHost {
    state: Mutex<SimState>,
    next_id: AtomicU64,
    removals_tx: broadcast::Sender<TabId>,
}

impl SimulatedHost {
    pub fn new() -> Self {
        let (removals_tx, _) = broadcast::channel(REMOVAL_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(SimState::default()),
            next_id: AtomicU64::new(1),
            removals_tx,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        // A poisoned lock only happens if a panicking test held it; the
        // inner state is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of open tabs.
    pub fn tab_count(&self) -> usize {
        self.lock().tabs.len()
    }

    /// The currently focused tab, if any.
    pub fn focused_tab(&self) -> Option<TabId> {
        self.lock().focused
    }

    /// The URL a tab currently shows.
    pub fn url_of(&self, tab: TabId) -> Option<String> {
        self.lock().tabs.get(&tab).cloned()
    }

    /// Snapshot of all recorded operations.
    pub fn actions(&self) -> Vec<HostAction> {
        self.lock().actions.clone()
    }

    pub fn clear_actions(&self) {
        self.lock().actions.clear();
    }

    /// Make every subsequent operation on `tab` fail.
    pub fn fail_tab(&self, tab: TabId) {
        self.lock().failing.insert(tab);
    }

    /// Undo [`fail_tab`](Self::fail_tab).
    pub fn heal_tab(&self, tab: TabId) {
        self.lock().failing.remove(&tab);
    }

    /// Overwrite the URL a tab displays, simulating a redirect.
    pub fn set_url(&self, tab: TabId, url: impl Into<String>) {
        if let Some(slot) = self.lock().tabs.get_mut(&tab) {
            *slot = url.into();
        }
    }

    /// Close a tab as the user would, broadcasting a removal event.
    pub fn close_externally(&self, tab: TabId) {
        let removed = {
            let mut state = self.lock();
            state.failing.remove(&tab);
            if state.focused == Some(tab) {
                state.focused = None;
            }
            state.tabs.remove(&tab).is_some()
        };
        if removed {
            debug!(%tab, "tab closed externally");
            let _ = self.removals_tx.send(tab);
        }
    }

    fn check(&self, state: &SimState, tab: TabId) -> HostResult<()> {
        if state.failing.contains(&tab) {
            return Err(HostError::Backend(format!("injected failure on tab {tab}")));
        }
        if !state.tabs.contains_key(&tab) {
            return Err(HostError::TabNotFound { tab });
        }
        Ok(())
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabHost for SimulatedHost {
    async fn open(&self, url: &str, focused: bool) -> HostResult<TabId> {
        let tab = TabId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut state = self.lock();
        state.tabs.insert(tab, url.to_string());
        if focused {
            state.focused = Some(tab);
        }
        state.actions.push(HostAction::Opened {
            tab,
            url: url.to_string(),
            focused,
        });
        debug!(%tab, %url, focused, "tab opened");
        Ok(tab)
    }

    async fn activate(&self, tab: TabId) -> HostResult<()> {
        let mut state = self.lock();
        self.check(&state, tab)?;
        state.focused = Some(tab);
        state.actions.push(HostAction::Activated { tab });
        Ok(())
    }

    async fn navigate(&self, tab: TabId, url: &str) -> HostResult<()> {
        let mut state = self.lock();
        self.check(&state, tab)?;
        state.tabs.insert(tab, url.to_string());
        state.actions.push(HostAction::Navigated {
            tab,
            url: url.to_string(),
        });
        Ok(())
    }

    async fn reload(&self, tab: TabId) -> HostResult<()> {
        let mut state = self.lock();
        self.check(&state, tab)?;
        state.actions.push(HostAction::Reloaded { tab });
        Ok(())
    }

    async fn close(&self, tab: TabId) -> HostResult<()> {
        let mut state = self.lock();
        self.check(&state, tab)?;
        state.tabs.remove(&tab);
        if state.focused == Some(tab) {
            state.focused = None;
        }
        state.actions.push(HostAction::Closed { tab });
        // Scheduler-initiated closes are deliberately not broadcast; the
        // removal stream carries external closes only.
        Ok(())
    }

    async fn current_url(&self, tab: TabId) -> HostResult<String> {
        let state = self.lock();
        self.check(&state, tab)?;
        Ok(state.tabs[&tab].clone())
    }

    fn removals(&self) -> broadcast::Receiver<TabId> {
        self.removals_tx.subscribe()
    }
}

// ============================================================================
// Tests
// ============================================================================
