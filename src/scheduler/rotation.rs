//! The tab rotation cycle
//!
//! [`RotationScheduler`] owns the whole lifecycle: it opens one background
//! tab per configured URL, focuses them in order on a two-tier timer (short
//! wait between tabs, long wait once per lap), reloads each tab on visit,
//! swaps URLs when a time rule flips, and cleans up when tabs are closed
//! under it.
//!
//! All mutable state lives in one [`RotationState`] behind an async mutex,
//! so timer callbacks and removal events are serialized and at most one tick
//! is ever in flight. Armed timers are spawned tasks holding the run's
//! generation number; pausing aborts the task and bumps the generation, which
//! also suppresses the reschedule of any tick that was already executing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::host::{TabHost, TabId};
use crate::models::{Settings, TimeOfDay};
use crate::notify::{Notice, NotificationHub};
use crate::rules::RuleSet;
use crate::storage::SettingsStore;

use super::error::{SchedulerError, SchedulerResult};

/// Settle time after navigating a tab to a new URL, before reloading.
const NAVIGATION_SETTLE: Duration = Duration::from_secs(2);

/// Countdown log cadence during long waits.
const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(30);

/// Waits shorter than this skip the countdown logger.
const COUNTDOWN_MIN_DELAY: Duration = Duration::from_secs(60);

const EVENT_CHANNEL_CAPACITY: usize = 128;

// ============================================================================
// Timing
// ============================================================================

/// Resolved delay set for a rotation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Wait after completing a full lap.
    pub long_wait: Duration,
    /// Wait between tabs within a lap.
    pub short_wait: Duration,
    /// Delay between focusing a tab and reloading it.
    pub pre_refresh: Duration,
}

impl Timing {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            long_wait: settings.long_wait(),
            short_wait: settings.short_wait(),
            pre_refresh: settings.pre_refresh(),
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

// ============================================================================
// Events and snapshots
// ============================================================================

/// Events emitted as the cycle progresses
#[derive(Debug, Clone)]
pub enum RotationEvent {
    /// A run started with this many tabs
    Started { tabs: usize },
    /// The tab at `index` was focused for its visit
    Visited { index: usize },
    /// A time rule flipped and the tab was navigated to its active URL
    UrlSwapped { index: usize },
    /// Every tab has been shown; back at index 0
    LapCompleted,
    /// The visit at `index` failed; the cycle skipped ahead
    TickFailed { index: usize },
    /// A tracked tab was closed externally
    TabRemoved { tab: TabId },
    /// The cycle was paused
    Paused,
    /// The last tracked tab was closed; the cycle stopped itself
    Drained,
}

/// Result of a successful start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOutcome {
    pub tab_count: usize,
}

/// Point-in-time snapshot of the cycle
#[derive(Debug, Clone)]
pub struct RotationStatus {
    pub is_running: bool,
    pub tab_count: usize,
    pub current_index: usize,
    pub next_tick_at: Option<DateTime<Local>>,
}

impl RotationStatus {
    /// Format as display string
    pub fn display(&self) -> String {
        let mut output = String::from("Rotation Status\n");
        output.push_str(&format!("{:-<40}\n", ""));
        output.push_str(&format!("Running: {}\n", self.is_running));
        output.push_str(&format!("Tabs: {}\n", self.tab_count));
        output.push_str(&format!("Current Index: {}\n", self.current_index));
        if let Some(next) = self.next_tick_at {
            output.push_str(&format!("Next Step: {}\n", next.format("%H:%M:%S")));
        }
        output
    }
}

// ============================================================================
// Rotation state
// ============================================================================

#[derive(Default)]
struct RotationState {
    /// Managed tab handles, in rotation order.
    tabs: Vec<TabId>,
    /// Configured URL per tab, same order and length as `tabs`.
    urls: Vec<String>,
    rules: RuleSet,
    timing: Timing,
    index: usize,
    running: bool,
    timer: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
    next_tick_at: Option<DateTime<Local>>,
}

impl RotationState {
    fn cancel_timers(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(countdown) = self.countdown.take() {
            countdown.abort();
        }
        self.next_tick_at = None;
    }
}

// ============================================================================
// Scheduler
// ============================================================================

/// The rotation scheduler
///
/// Create with [`RotationScheduler::new`], then call
/// [`spawn_removal_listener`](Self::spawn_removal_listener) once so external
/// tab closes are observed.
pub struct RotationScheduler {
    host: Arc<dyn TabHost>,
    store: Arc<SettingsStore>,
    notices: Arc<NotificationHub>,
    state: Mutex<RotationState>,
    /// Bumped on every start and pause; armed timers carry the value they
    /// were created under and go inert when it moves on.
    generation: AtomicU64,
    events: broadcast::Sender<RotationEvent>,
}

impl RotationScheduler {
    pub fn new(
        host: Arc<dyn TabHost>,
        store: Arc<SettingsStore>,
        notices: Arc<NotificationHub>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            host,
            store,
            notices,
            state: Mutex::new(RotationState::default()),
            generation: AtomicU64::new(0),
            events,
        })
    }

    /// Subscribe to cycle progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<RotationEvent> {
        self.events.subscribe()
    }

    /// Watch the host's removal stream and clean up tracked tabs that are
    /// closed externally. Call once after construction.
    pub fn spawn_removal_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        let mut removals = self.host.removals();
        tokio::spawn(async move {
            loop {
                match removals.recv().await {
                    Ok(tab) => scheduler.handle_removed(tab).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "tab removal events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Start (or restart) the rotation cycle.
    ///
    /// Reads settings fresh from the store, closes any tabs left over from a
    /// previous run, opens one background tab per active URL, focuses the
    /// first and arms the long-wait timer.
    pub async fn start(self: &Arc<Self>) -> SchedulerResult<StartOutcome> {
        let settings = self.store.load().await?;
        if settings.urls.is_empty() {
            warn!("start requested with no URLs configured");
            self.notices
                .publish(Notice::config_error(
                    "No URLs configured. Add at least one URL before starting.",
                ))
                .await;
            return Err(SchedulerError::NoUrlsConfigured);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = self.state.lock().await;
        let st = &mut *guard;
        st.cancel_timers();
        st.running = false;

        // Best-effort cleanup of a previous run; the tabs may already be gone.
        let leftovers = std::mem::take(&mut st.tabs);
        let closures = futures::future::join_all(leftovers.iter().map(|tab| self.host.close(*tab)));
        for (tab, result) in leftovers.iter().zip(closures.await) {
            if let Err(err) = result {
                debug!(%tab, %err, "leftover tab could not be closed");
            }
        }

        st.urls = settings.urls.clone();
        st.rules = RuleSet::new(settings.rules.clone());
        st.timing = Timing::from_settings(&settings);
        st.index = 0;

        let now = TimeOfDay::now_local();
        for base in st.urls.iter() {
            let active = st.rules.active_url(base, now);
            let tab = self.host.open(active, false).await?;
            st.tabs.push(tab);
        }

        self.host.activate(st.tabs[0]).await?;
        st.running = true;
        let tab_count = st.tabs.len();
        let long_wait = st.timing.long_wait;
        self.arm(st, long_wait, generation);
        drop(guard);

        info!(tabs = tab_count, "rotation cycle started");
        self.notices
            .publish(Notice::started(tab_count, long_wait))
            .await;
        let _ = self.events.send(RotationEvent::Started { tabs: tab_count });

        Ok(StartOutcome { tab_count })
    }

    /// Pause the cycle. Tabs stay open. Returns whether a running cycle was
    /// actually paused; pausing an idle scheduler is a no-op that still
    /// counts as success.
    pub async fn pause(&self) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.state.lock().await;
        guard.cancel_timers();
        let was_running = guard.running;
        guard.running = false;
        drop(guard);

        if was_running {
            info!("rotation cycle paused");
            self.notices.publish(Notice::paused()).await;
            let _ = self.events.send(RotationEvent::Paused);
        }
        was_running
    }

    /// Snapshot the cycle state.
    pub async fn status(&self) -> RotationStatus {
        let guard = self.state.lock().await;
        RotationStatus {
            is_running: guard.running,
            tab_count: guard.tabs.len(),
            current_index: guard.index,
            next_tick_at: guard.next_tick_at,
        }
    }

    /// Refresh timing and rules from a newly saved settings record.
    ///
    /// Applies to subsequently armed delays; the currently armed timer keeps
    /// its original delay. The tab list is not touched; URLs take effect on
    /// the next start.
    pub async fn apply_settings(&self, settings: &Settings) {
        let mut guard = self.state.lock().await;
        guard.timing = Timing::from_settings(settings);
        guard.rules = RuleSet::new(settings.rules.clone());
        debug!("settings refresh applied to cycle");
    }

    /// One timer firing: visit the current tab, advance, re-arm.
    async fn tick(self: Arc<Self>, generation: u64) {
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        let mut guard = self.state.lock().await;
        // Re-check under the lock: a start or pause may have won the race
        // between the timer firing and this tick acquiring the state.
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        let st = &mut *guard;
        // This task's own handle; it is about to finish anyway.
        st.timer.take();
        if let Some(countdown) = st.countdown.take() {
            countdown.abort();
        }
        if !st.running || st.tabs.is_empty() {
            return;
        }

        match self.visit_and_advance(st).await {
            Ok(next_delay) => self.arm(st, next_delay, generation),
            Err(err) => {
                // Degraded continuation: skip the troublesome tab and keep
                // the cycle alive.
                warn!(%err, index = st.index, "rotation step failed, skipping ahead");
                let _ = self.events.send(RotationEvent::TickFailed { index: st.index });
                if st.running && !st.tabs.is_empty() {
                    st.index = (st.index + 1) % st.tabs.len();
                    let delay = st.timing.short_wait;
                    self.arm(st, delay, generation);
                }
            }
        }
    }

    /// The body of a tick: focus, wait, resync URL, reload, advance.
    /// Returns the delay to arm next.
    async fn visit_and_advance(&self, st: &mut RotationState) -> SchedulerResult<Duration> {
        let tab = st.tabs[st.index];
        self.host.activate(tab).await?;
        let _ = self.events.send(RotationEvent::Visited { index: st.index });
        debug!(index = st.index, %tab, "focused tab, waiting pre-refresh delay");
        tokio::time::sleep(st.timing.pre_refresh).await;

        // Rules may have flipped since the tab was opened, so the active URL
        // is recomputed on every visit.
        let expected = st
            .rules
            .active_url(&st.urls[st.index], TimeOfDay::now_local())
            .to_string();
        let current = self.host.current_url(tab).await?;
        if !current.starts_with(&expected) {
            info!(index = st.index, from = %current, to = %expected, "tab URL out of date, navigating");
            self.host.navigate(tab, &expected).await?;
            let _ = self.events.send(RotationEvent::UrlSwapped { index: st.index });
            tokio::time::sleep(NAVIGATION_SETTLE).await;
        }

        self.host.reload(tab).await?;
        debug!(index = st.index, url = %expected, "tab reloaded");

        st.index = (st.index + 1) % st.tabs.len();
        if st.index == 0 {
            debug!("lap completed, returning to first tab for the long wait");
            tokio::time::sleep(st.timing.short_wait).await;
            self.host.activate(st.tabs[0]).await?;
            let _ = self.events.send(RotationEvent::LapCompleted);
            Ok(st.timing.long_wait)
        } else {
            Ok(st.timing.short_wait)
        }
    }

    /// Arm the next tick and, for long waits, the countdown logger.
    fn arm(self: &Arc<Self>, st: &mut RotationState, delay: Duration, generation: u64) {
        let deadline = Local::now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
        st.next_tick_at = Some(deadline);
        info!(
            delay_secs = delay.as_secs(),
            next = %deadline.format("%H:%M:%S"),
            "next rotation step scheduled"
        );

        let scheduler = Arc::clone(self);
        st.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.tick(generation).await;
        }));

        if delay >= COUNTDOWN_MIN_DELAY {
            let scheduler = Arc::clone(self);
            let end = tokio::time::Instant::now() + delay;
            st.countdown = Some(tokio::spawn(async move {
                loop {
                    tokio::time::sleep(COUNTDOWN_INTERVAL).await;
                    if scheduler.generation.load(Ordering::SeqCst) != generation {
                        break;
                    }
                    let remaining = end.saturating_duration_since(tokio::time::Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    info!(
                        remaining_secs = remaining.as_secs(),
                        "waiting for next rotation step"
                    );
                }
            }));
        }
    }

    /// A tracked tab was closed externally: drop it (and its configured URL)
    /// from the rotation, keep the remainder in order, and stop if nothing
    /// is left.
    async fn handle_removed(&self, tab: TabId) {
        let mut guard = self.state.lock().await;
        let Some(pos) = guard.tabs.iter().position(|t| *t == tab) else {
            return;
        };
        guard.tabs.remove(pos);
        if pos < guard.urls.len() {
            guard.urls.remove(pos);
        }
        if guard.index >= guard.tabs.len() && !guard.tabs.is_empty() {
            guard.index = 0;
        }
        info!(%tab, remaining = guard.tabs.len(), "managed tab closed externally");
        let _ = self.events.send(RotationEvent::TabRemoved { tab });

        if guard.tabs.is_empty() {
            self.generation.fetch_add(1, Ordering::SeqCst);
            guard.cancel_timers();
            let was_running = guard.running;
            guard.running = false;
            drop(guard);

            if was_running {
                info!("all managed tabs closed, rotation stopped");
                self.notices.publish(Notice::drained()).await;
            }
            let _ = self.events.send(RotationEvent::Drained);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
