//! Integration tests for the rotation cycle
//!
//! These run the real scheduler against the simulated host with the clock
//! paused, so the multi-minute waits of the stock settings elapse instantly
//! and deterministically.

mod common;

use std::time::Duration;

use common::{build_engine, settings_with_urls};
use tokio::sync::broadcast;
use tokio::time::Instant;
use zoetrope::host::HostAction;
use zoetrope::models::{Settings, TimeRule};
use zoetrope::scheduler::RotationEvent;

async fn next_event(events: &mut broadcast::Receiver<RotationEvent>) -> RotationEvent {
    tokio::time::timeout(Duration::from_secs(7200), events.recv())
        .await
        .expect("timed out waiting for rotation event")
        .expect("event channel closed")
}

// ============================================================================
// The start/tick/lap scenario
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_two_tab_cycle() {
    // urls = [a, b], longWait = 5 min, shortWait = 10 s, preRefresh = 2 s
    let engine = build_engine(settings_with_urls(&["https://a.example", "https://b.example"]));
    let mut events = engine.scheduler.subscribe();
    let t0 = Instant::now();

    engine.scheduler.start().await.unwrap();
    assert_eq!(engine.host.tab_count(), 2);
    let first_tab = engine.host.focused_tab().expect("first tab focused");

    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Started { tabs: 2 }
    ));

    // The long wait elapses before the first visit
    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Visited { index: 0 }
    ));
    let elapsed = t0.elapsed();
    assert!(
        elapsed >= Duration::from_secs(300) && elapsed < Duration::from_secs(302),
        "first visit after {elapsed:?}, expected the 5-minute long wait"
    );

    // The short wait separates the tabs within the lap
    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Visited { index: 1 }
    ));
    let elapsed = t0.elapsed();
    assert!(
        elapsed >= Duration::from_secs(312) && elapsed < Duration::from_secs(314),
        "second visit after {elapsed:?}, expected pre-refresh + short wait"
    );

    // Index wraps to 0: the lap branch refocuses the first tab
    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::LapCompleted
    ));
    assert_eq!(engine.host.focused_tab(), Some(first_tab));

    // Both tabs were reloaded exactly once
    let reloads = engine
        .host
        .actions()
        .iter()
        .filter(|a| matches!(a, HostAction::Reloaded { .. }))
        .count();
    assert_eq!(reloads, 2);

    let status = engine.scheduler.status().await;
    assert!(status.is_running);
    assert_eq!(status.current_index, 0);
    assert!(status.next_tick_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_second_lap_follows_the_long_wait() {
    let engine = build_engine(settings_with_urls(&["https://a.example"]));
    let mut events = engine.scheduler.subscribe();

    engine.scheduler.start().await.unwrap();
    loop {
        if matches!(next_event(&mut events).await, RotationEvent::LapCompleted) {
            break;
        }
    }
    let lap_end = Instant::now();

    // A single-tab rotation wraps every tick; the next visit comes a long
    // wait after the lap completed
    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Visited { index: 0 }
    ));
    let gap = lap_end.elapsed();
    assert!(
        gap >= Duration::from_secs(300) && gap < Duration::from_secs(302),
        "next lap after {gap:?}"
    );
}

// ============================================================================
// Pause
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_cancels_the_armed_timer() {
    let engine = build_engine(settings_with_urls(&["https://a.example"]));
    let mut events = engine.scheduler.subscribe();

    engine.scheduler.start().await.unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Started { .. }
    ));

    assert!(engine.scheduler.pause().await);
    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Paused
    ));

    // Even hours later no visit fires
    let nothing = tokio::time::timeout(Duration::from_secs(7200), events.recv()).await;
    assert!(nothing.is_err(), "got {nothing:?} after pause");

    // Tabs stayed open, state is idle
    assert_eq!(engine.host.tab_count(), 1);
    let status = engine.scheduler.status().await;
    assert!(!status.is_running);
    assert!(status.next_tick_at.is_none());
}

// ============================================================================
// URL resync on visit
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_visit_resyncs_a_drifted_tab() {
    let mut settings = settings_with_urls(&["https://site.example"]);
    // Zero-width window: never active, so the replacement is always expected
    settings.rules = vec![TimeRule {
        original_url: "https://site.example".into(),
        replacement_url: "https://blank.example".into(),
        start: "00:00".parse().unwrap(),
        end: "00:00".parse().unwrap(),
    }];
    let engine = build_engine(settings);
    let mut events = engine.scheduler.subscribe();

    engine.scheduler.start().await.unwrap();
    let tab = engine.host.focused_tab().unwrap();
    assert_eq!(
        engine.host.url_of(tab).as_deref(),
        Some("https://blank.example")
    );

    // The tab wanders off (user clicked a link, page redirected, ...)
    engine.host.set_url(tab, "https://elsewhere.example/news");

    loop {
        match next_event(&mut events).await {
            RotationEvent::UrlSwapped { index: 0 } => break,
            RotationEvent::Started { .. } | RotationEvent::Visited { .. } => {}
            other => panic!("unexpected event {other:?}"),
        }
    }

    // The visit navigated the tab back to its active URL and reloaded it
    assert_eq!(
        engine.host.url_of(tab).as_deref(),
        Some("https://blank.example")
    );
    let actions = engine.host.actions();
    assert!(actions
        .iter()
        .any(|a| matches!(a, HostAction::Navigated { url, .. } if url == "https://blank.example")));
    assert!(actions
        .iter()
        .any(|a| matches!(a, HostAction::Reloaded { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_prefix_match_tolerates_suffixes() {
    let engine = build_engine(settings_with_urls(&["https://a.example"]));
    let mut events = engine.scheduler.subscribe();

    engine.scheduler.start().await.unwrap();
    let tab = engine.host.focused_tab().unwrap();
    // Session suffixes and redirects below the configured URL are fine
    engine.host.set_url(tab, "https://a.example/dashboard?session=42");

    loop {
        if matches!(next_event(&mut events).await, RotationEvent::LapCompleted) {
            break;
        }
    }

    let actions = engine.host.actions();
    assert!(
        !actions.iter().any(|a| matches!(a, HostAction::Navigated { .. })),
        "prefix-matching URL should not be re-navigated"
    );
    assert!(actions.iter().any(|a| matches!(a, HostAction::Reloaded { .. })));
}

// ============================================================================
// Degraded continuation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_tick_failure_skips_ahead() {
    let engine = build_engine(settings_with_urls(&["https://a.example", "https://b.example"]));
    let mut events = engine.scheduler.subscribe();

    engine.scheduler.start().await.unwrap();
    let first_tab = engine.host.focused_tab().unwrap();
    engine.host.fail_tab(first_tab);

    let mut saw_failure = false;
    loop {
        match next_event(&mut events).await {
            RotationEvent::TickFailed { index: 0 } => saw_failure = true,
            RotationEvent::Visited { index: 1 } => break,
            RotationEvent::Started { .. } => {}
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert!(saw_failure, "failed visit should be reported before skipping");

    // The cycle is still alive
    assert!(engine.scheduler.status().await.is_running);
}

// ============================================================================
// External tab closes
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_external_close_keeps_rotation_going() {
    let engine = build_engine(settings_with_urls(&[
        "https://a.example",
        "https://b.example",
        "https://c.example",
    ]));
    let mut events = engine.scheduler.subscribe();

    engine.scheduler.start().await.unwrap();
    let opened: Vec<_> = engine
        .host
        .actions()
        .iter()
        .filter_map(|a| match a {
            HostAction::Opened { tab, .. } => Some(*tab),
            _ => None,
        })
        .collect();

    engine.host.close_externally(opened[1]);
    loop {
        if matches!(next_event(&mut events).await, RotationEvent::TabRemoved { .. }) {
            break;
        }
    }

    let status = engine.scheduler.status().await;
    assert!(status.is_running);
    assert_eq!(status.tab_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_range_index_resets_to_zero() {
    let engine = build_engine(settings_with_urls(&[
        "https://a.example",
        "https://b.example",
        "https://c.example",
    ]));
    let mut events = engine.scheduler.subscribe();

    engine.scheduler.start().await.unwrap();
    let opened: Vec<_> = engine
        .host
        .actions()
        .iter()
        .filter_map(|a| match a {
            HostAction::Opened { tab, .. } => Some(*tab),
            _ => None,
        })
        .collect();

    // Let the cycle advance so the index points past the survivors
    loop {
        if matches!(
            next_event(&mut events).await,
            RotationEvent::Visited { index: 1 }
        ) {
            break;
        }
    }

    engine.host.close_externally(opened[2]);
    engine.host.close_externally(opened[1]);
    let mut removed = 0;
    while removed < 2 {
        if matches!(next_event(&mut events).await, RotationEvent::TabRemoved { .. }) {
            removed += 1;
        }
    }

    let status = engine.scheduler.status().await;
    assert!(status.is_running);
    assert_eq!(status.tab_count, 1);
    assert_eq!(status.current_index, 0);

    // The next visit lands on the surviving first tab
    loop {
        match next_event(&mut events).await {
            RotationEvent::Visited { index } => {
                assert_eq!(index, 0);
                break;
            }
            RotationEvent::LapCompleted | RotationEvent::TickFailed { .. } => {}
            other => panic!("unexpected event {other:?}"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_closing_the_only_tab_stops_the_cycle() {
    let engine = build_engine(settings_with_urls(&["https://a.example"]));
    let mut events = engine.scheduler.subscribe();

    engine.scheduler.start().await.unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Started { tabs: 1 }
    ));

    let tab = engine.host.focused_tab().unwrap();
    engine.host.close_externally(tab);

    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::TabRemoved { .. }
    ));
    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Drained
    ));

    let status = engine.scheduler.status().await;
    assert!(!status.is_running);
    assert_eq!(status.tab_count, 0);
    assert!(status.next_tick_at.is_none());

    // And nothing ever fires again
    let nothing = tokio::time::timeout(Duration::from_secs(7200), events.recv()).await;
    assert!(nothing.is_err());
}

// ============================================================================
// Live settings refresh
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_saved_settings_apply_to_later_delays() {
    let engine = build_engine(settings_with_urls(&["https://a.example", "https://b.example"]));
    let mut events = engine.scheduler.subscribe();

    engine.scheduler.start().await.unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Started { .. }
    ));

    // Shrink the short wait while the long wait is armed
    let mut updated = settings_with_urls(&["https://a.example", "https://b.example"]);
    updated.short_wait = 3;
    engine.scheduler.apply_settings(&updated).await;

    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Visited { index: 0 }
    ));
    let visit0 = Instant::now();

    assert!(matches!(
        next_event(&mut events).await,
        RotationEvent::Visited { index: 1 }
    ));
    // pre-refresh (2 s) + the *new* short wait (3 s)
    let gap = visit0.elapsed();
    assert!(
        gap >= Duration::from_secs(5) && gap < Duration::from_secs(7),
        "second visit after {gap:?}, expected the refreshed short wait"
    );
}

// ============================================================================
// Router-level status
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_status_through_the_router() {
    let engine = build_engine(settings_with_urls(&["https://a.example"]));

    let response = engine
        .router
        .dispatch_json(r#"{"action": "getStatus"}"#)
        .await;
    assert_eq!(response, r#"{"isRunning":false}"#);

    engine.router.dispatch_json(r#"{"action": "start"}"#).await;
    let response = engine
        .router
        .dispatch_json(r#"{"action": "getStatus"}"#)
        .await;
    assert_eq!(response, r#"{"isRunning":true}"#);

    let response = engine
        .router
        .dispatch_json(r#"{"action": "pause"}"#)
        .await;
    assert_eq!(response, r#"{"success":true}"#);
}

// Settings used across the suite keep their stock defaults; pin them here so
// a default change is caught loudly rather than silently shifting the
// timing assertions above.
#[test]
fn test_suite_assumes_stock_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.long_wait, 5);
    assert_eq!(settings.short_wait, 10);
    assert_eq!(settings.pre_refresh, 2.0);
}
