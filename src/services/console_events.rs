use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        card::CardView,
        claims::ClaimOutcome,
        owners::OwnerSummary,
        session::{ConsoleSnapshot, HistoryEntryView},
        sse::{
            AuthExpiredEvent, CalledEvent, CardUpdatedEvent, ClaimResolvedEvent, HistoryEvent,
            ResetEvent, RosterEvent, ServerEvent, StatusEvent, StatusKind, SystemStatus,
        },
    },
    error::ServiceError,
    state::{SharedState, store::StoreUpdate},
};

const EVENT_SNAPSHOT: &str = "session.snapshot";
const EVENT_CALLED: &str = "session.called";
const EVENT_RESET: &str = "session.reset";
const EVENT_STATUS: &str = "status";
const EVENT_HISTORY: &str = "history";
const EVENT_ROSTER: &str = "owners.roster";
const EVENT_CARD_UPDATED: &str = "card.updated";
const EVENT_CLAIM_RESOLVED: &str = "claim.resolved";
const EVENT_AUTH_EXPIRED: &str = "auth.expired";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Publish the consequences of a store write: reset, new call, then the fresh snapshot.
pub async fn broadcast_store_update(state: &SharedState, update: StoreUpdate) {
    let snapshot = state.store().snapshot().await;
    if update.reset {
        let payload = ResetEvent {
            game_id: snapshot.selected.clone(),
        };
        send_event(state, EVENT_RESET, &payload);
    }
    if let (Some(number), Some(game_id)) = (update.called, snapshot.selected.clone()) {
        send_event(state, EVENT_CALLED, &CalledEvent { game_id, number });
    }

    let view = ConsoleSnapshot::from(snapshot);
    if update.reset || update.called.is_some() {
        broadcast_history(state, &view);
    }
    send_event(state, EVENT_SNAPSHOT, &view);
}

/// Publish the current snapshot without any store write.
pub async fn broadcast_snapshot(state: &SharedState) -> ConsoleSnapshot {
    let view = ConsoleSnapshot::from(state.store().snapshot().await);
    send_event(state, EVENT_SNAPSHOT, &view);
    view
}

fn broadcast_history(state: &SharedState, view: &ConsoleSnapshot) {
    let payload = HistoryEvent {
        entries: view.history.clone(),
        last_action: view.last_action.clone(),
    };
    send_event(state, EVENT_HISTORY, &payload);
}

/// Record an operator action in the history and tell observers about it.
pub async fn record_action(state: &SharedState, message: &str) {
    state.store().record_action(message).await;
    let history: Vec<HistoryEntryView> = state
        .store()
        .history()
        .await
        .into_iter()
        .map(HistoryEntryView::from)
        .collect();
    let payload = HistoryEvent {
        entries: history,
        last_action: Some(message.to_string()),
    };
    send_event(state, EVENT_HISTORY, &payload);
    broadcast_status(state, StatusKind::Ok, message);
}

/// Send a status line to every subscriber.
pub fn broadcast_status(state: &SharedState, kind: StatusKind, message: &str) {
    let payload = StatusEvent {
        kind,
        message: message.to_string(),
    };
    send_event(state, EVENT_STATUS, &payload);
}

/// Surface a failed operation: an error status, plus `auth.expired` for refused credentials.
pub fn broadcast_failure(state: &SharedState, err: &ServiceError) {
    let message = err.to_string();
    broadcast_status(state, StatusKind::Err, &message);
    if err.is_unauthorized() {
        send_event(state, EVENT_AUTH_EXPIRED, &AuthExpiredEvent { message });
    }
}

/// Pass a result through, broadcasting its failure first.
pub fn report<T>(state: &SharedState, result: Result<T, ServiceError>) -> Result<T, ServiceError> {
    if let Err(err) = &result {
        broadcast_failure(state, err);
    }
    result
}

/// Broadcast the reloaded owner roster.
pub fn broadcast_roster(state: &SharedState, game_id: &str, owners: &[OwnerSummary]) {
    let payload = RosterEvent {
        game_id: game_id.to_string(),
        owners: owners.to_vec(),
    };
    send_event(state, EVENT_ROSTER, &payload);
}

/// Broadcast the inspected card after it was loaded, marked or replaced.
pub fn broadcast_card(state: &SharedState, card: &CardView) {
    send_event(state, EVENT_CARD_UPDATED, &CardUpdatedEvent(card.clone()));
}

/// Broadcast the end of a claim resolution.
pub fn broadcast_claim_resolved(
    state: &SharedState,
    game_id: &str,
    card_id: &str,
    outcome: ClaimOutcome,
) {
    let payload = ClaimResolvedEvent {
        game_id: game_id.to_string(),
        card_id: card_id.to_string(),
        outcome,
    };
    send_event(state, EVENT_CLAIM_RESOLVED, &payload);
}

/// Broadcast a change of the degraded flag.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_event<T>(state: &SharedState, event: &str, payload: &T)
where
    T: Serialize,
{
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(message) => state.events().broadcast(message),
        Err(err) => warn!(event, error = %err, "failed to serialize console SSE event"),
    }
}
