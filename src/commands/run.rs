//! The `run` command: drive the rotation against the simulated host

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::host::SimulatedHost;
use crate::notify::{LogChannel, NotificationHub, WebhookChannel, WebhookConfig};
use crate::router::{Command, Response, Router};
use crate::scheduler::{RotationEvent, RotationScheduler};
use crate::storage::SettingsStore;

/// Run the rotation cycle until interrupted (or, with `once`, for a single
/// lap). Tabs live in the built-in simulated host; real browser hosts plug
/// in through the [`TabHost`](crate::host::TabHost) trait.
pub async fn run(config: Config, once: bool) -> Result<()> {
    config.validate()?;

    let store = Arc::new(SettingsStore::with_file(&config.settings_path));
    store.load().await?;

    let mut hub = NotificationHub::new();
    hub.add_channel(Box::new(LogChannel));
    if let Some(url) = &config.notifications.webhook_url {
        let mut webhook = WebhookConfig::new(url);
        if let Some(token) = &config.notifications.webhook_token {
            webhook = webhook.with_auth_token(token);
        }
        hub.add_channel(Box::new(WebhookChannel::new(webhook)?));
        info!("webhook notifications enabled");
    }

    let host = Arc::new(SimulatedHost::new());
    let scheduler = RotationScheduler::new(host, store.clone(), Arc::new(hub));
    scheduler.spawn_removal_listener();
    let router = Router::new(store, scheduler.clone());

    let mut events = scheduler.subscribe();
    if let Response::Outcome {
        success: false,
        error,
        ..
    } = router.dispatch(Command::Start).await
    {
        anyhow::bail!(
            "rotation could not start: {}",
            error.unwrap_or_else(|| String::from("unknown error"))
        );
    }

    if once {
        // One full lap, then stop
        loop {
            match events.recv().await {
                Ok(RotationEvent::LapCompleted) | Ok(RotationEvent::Drained) | Err(_) => break,
                Ok(_) => {}
            }
        }
    } else {
        tokio::signal::ctrl_c().await?;
        info!("interrupt received, pausing rotation");
    }

    scheduler.pause().await;
    println!("{}", scheduler.status().await.display());
    Ok(())
}
