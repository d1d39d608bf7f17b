//! Background worker that drops idle popup sessions.
//!
//! A session's reveal timer keeps running until it is unmounted. Visitors
//! rarely say goodbye, so sessions untouched for longer than the idle
//! window are unmounted and removed on each tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use crate::state::AppState;

/// Sweep every `interval` until `shutdown` flips.
pub async fn session_sweeper(
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
    interval: Duration,
    max_idle: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(
        interval_secs = interval.as_secs(),
        max_idle_secs = max_idle.as_secs(),
        "session sweeper started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                state.sweep_idle(max_idle).await;
            }
            _ = shutdown.changed() => {
                info!("session sweeper shutting down");
                return;
            }
        }
    }
}
