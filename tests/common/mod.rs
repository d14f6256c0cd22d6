//! Common test utilities

use std::sync::Arc;

use zoetrope::host::SimulatedHost;
use zoetrope::models::Settings;
use zoetrope::notify::NotificationHub;
use zoetrope::router::Router;
use zoetrope::scheduler::RotationScheduler;
use zoetrope::storage::SettingsStore;

/// Everything a rotation test needs, wired to the simulated host
#[allow(dead_code)]
pub struct Engine {
    pub host: Arc<SimulatedHost>,
    pub store: Arc<SettingsStore>,
    pub scheduler: Arc<RotationScheduler>,
    pub router: Router,
}

/// Build a full engine around an in-memory store seeded with `settings`.
pub fn build_engine(settings: Settings) -> Engine {
    let host = Arc::new(SimulatedHost::new());
    let store = Arc::new(SettingsStore::with_settings(settings));
    let scheduler = RotationScheduler::new(
        host.clone(),
        store.clone(),
        Arc::new(NotificationHub::new()),
    );
    scheduler.spawn_removal_listener();
    let router = Router::new(store.clone(), scheduler.clone());
    Engine {
        host,
        store,
        scheduler,
        router,
    }
}

/// A settings record with the given URLs and the stock timing defaults
/// (5 min long wait, 10 s short wait, 2 s pre-refresh).
pub fn settings_with_urls(urls: &[&str]) -> Settings {
    Settings {
        urls: urls.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}
