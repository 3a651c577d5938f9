//! Periodic refresh of the selected game.
//!
//! One timer exists per [`AppState`](crate::state::AppState). Ticks while no game is selected
//! or while the panel is hidden are no-op checks; the timer itself keeps running.

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::{
    services::{console_events::broadcast_failure, session_service::refresh_game},
    state::SharedState,
};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No game is selected.
    NoGame,
    /// The console panel is not the active view.
    Hidden,
    /// The snapshot was replaced.
    Refreshed,
    /// The response arrived after the operator switched games and was dropped.
    Discarded,
    /// The refresh failed; the next tick retries.
    Failed,
}

/// Start the refresh timer unless it is already running.
///
/// Returns `false` when a timer already exists; no second timer is ever created.
pub async fn ensure_polling(state: &SharedState) -> bool {
    let mut slot = state.poller().lock().await;
    if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
        return false;
    }

    let period = state.config().poll_interval();
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let outcome = poll_once(&task_state).await;
            debug!(?outcome, "poll tick");
        }
    });
    *slot = Some(handle);

    info!(interval_ms = period.as_millis() as u64, "polling started");
    true
}

/// Stop the refresh timer; returns whether one was running.
pub async fn stop_polling(state: &SharedState) -> bool {
    match state.poller().lock().await.take() {
        Some(handle) => {
            handle.abort();
            info!("polling stopped");
            true
        }
        None => false,
    }
}

/// Whether a refresh timer is running.
pub async fn is_polling(state: &SharedState) -> bool {
    state
        .poller()
        .lock()
        .await
        .as_ref()
        .is_some_and(|handle| !handle.is_finished())
}

/// Run one tick: refresh the selected game when the panel is visible.
pub async fn poll_once(state: &SharedState) -> PollOutcome {
    let Some(game_id) = state.store().selected().await else {
        return PollOutcome::NoGame;
    };
    if !state.is_panel_active() {
        return PollOutcome::Hidden;
    }

    match refresh_game(state, &game_id).await {
        Ok(true) => PollOutcome::Refreshed,
        Ok(false) => PollOutcome::Discarded,
        Err(err) => {
            warn!(game_id = %game_id, error = %err, "scheduled refresh failed");
            broadcast_failure(state, &err);
            PollOutcome::Failed
        }
    }
}
