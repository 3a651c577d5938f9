use tracing::{info, warn};
use validator::Validate;

use crate::{
    dto::{
        format_amount,
        session::{
            AdvanceResponse, BuyRequest, ConsoleSnapshot, CreateSessionRequest, GameListItem,
            PurchaseResponse, SeedPotRequest,
        },
        sse::StatusKind,
    },
    error::ServiceError,
    services::{
        console_events::{
            broadcast_failure, broadcast_snapshot, broadcast_status, broadcast_store_update,
            broadcast_system_status, record_action, report,
        },
        owner_service,
    },
    state::{
        SharedState,
        lifecycle::{SessionAction, ensure_permitted},
    },
    transport::{PurchaseParams, SessionSettings},
};

/// Current console view.
pub async fn snapshot(state: &SharedState) -> ConsoleSnapshot {
    ConsoleSnapshot::from(state.store().snapshot().await)
}

/// List the games known to the service.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameListItem>, ServiceError> {
    let games = report(
        state,
        state.transport().list_games().await.map_err(ServiceError::from),
    )?;
    Ok(games.into_iter().map(GameListItem::from).collect())
}

/// Switch the viewed game, or clear the selection with `None`.
///
/// Switching clears the history, the owner roster and the inspected card, then loads the
/// new game and its roster.
pub async fn select_game(
    state: &SharedState,
    game_id: Option<String>,
) -> Result<ConsoleSnapshot, ServiceError> {
    let game_id = game_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    switch_selection(state, game_id.clone()).await;
    if let Some(game_id) = &game_id {
        if report(state, refresh_game(state, game_id).await)? {
            reload_roster(state, game_id).await;
        }
    }
    Ok(broadcast_snapshot(state).await)
}

async fn switch_selection(state: &SharedState, game_id: Option<String>) {
    let update = state.store().select(game_id.clone()).await;
    if !update.reset {
        return;
    }
    state.owners().invalidate().await;
    state.inspected().write().await.take();
    info!(game_id = ?game_id, "selected game");
    broadcast_store_update(state, update).await;
}

/// Roster reload following a selection or a purchase; failures are published only.
async fn reload_roster(state: &SharedState, game_id: &str) {
    if let Err(err) = owner_service::reload_owners(state, game_id).await {
        warn!(game_id = %game_id, error = %err, "roster reload failed");
        broadcast_failure(state, &err);
    }
}

/// Manually refresh the selected game.
pub async fn refresh(state: &SharedState) -> Result<ConsoleSnapshot, ServiceError> {
    let game_id = report(state, require_selection(state).await)?;
    report(state, refresh_game(state, &game_id).await)?;
    broadcast_status(state, StatusKind::Ok, "Game refreshed.");
    Ok(snapshot(state).await)
}

/// Fetch `game_id` and apply it if it is still the selected game.
///
/// Returns `false` when the response was discarded as stale. Every outcome updates the
/// degraded flag.
pub(crate) async fn refresh_game(state: &SharedState, game_id: &str) -> Result<bool, ServiceError> {
    let fetched = state.transport().fetch_session(game_id).await;
    let session = match fetched {
        Ok(session) => session,
        Err(err) => {
            set_degraded(state, true);
            return Err(err.into());
        }
    };
    set_degraded(state, false);

    match state.store().apply_refresh(game_id, session).await {
        Some(update) => {
            broadcast_store_update(state, update).await;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Refresh forced after a mutation; failures are published but never returned.
pub(crate) async fn refresh_after_action(state: &SharedState, game_id: &str) {
    if let Err(err) = refresh_game(state, game_id).await {
        warn!(game_id = %game_id, error = %err, "refresh after action failed");
        broadcast_failure(state, &err);
    }
}

fn set_degraded(state: &SharedState, value: bool) {
    if !state.update_degraded(value) {
        return;
    }
    if value {
        warn!("game service unreachable, entering degraded mode");
    } else {
        info!("game service reachable again");
    }
    broadcast_system_status(state, value);
}

pub(crate) async fn require_selection(state: &SharedState) -> Result<String, ServiceError> {
    state
        .store()
        .selected()
        .await
        .ok_or_else(|| ServiceError::InvalidState("Select a game first.".into()))
}

/// Check `action` against the current snapshot and return the game it applies to.
pub(crate) async fn ensure_allowed(
    state: &SharedState,
    action: SessionAction,
) -> Result<String, ServiceError> {
    let (game_id, permitted) = state
        .store()
        .read_session(|session| {
            (
                session.map(|game| game.game_id.clone()),
                ensure_permitted(session, action),
            )
        })
        .await;
    permitted?;
    game_id.ok_or_else(|| ServiceError::InvalidState("Select a game first.".into()))
}

/// Create a game and make it the selected one.
pub async fn create_session(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<ConsoleSnapshot, ServiceError> {
    report(state, create(state, request).await)
}

async fn create(
    state: &SharedState,
    request: CreateSessionRequest,
) -> Result<ConsoleSnapshot, ServiceError> {
    request.validate()?;
    state
        .store()
        .read_session(|session| ensure_permitted(session, SessionAction::Create))
        .await?;

    let session = state.transport().create_session(request.into()).await?;
    let game_id = session.game_id.clone();
    info!(game_id = %game_id, title = %session.title, "created game");

    state.owners().invalidate().await;
    state.inspected().write().await.take();
    let update = state.store().set_session(session).await;
    broadcast_store_update(state, update).await;

    record_action(state, "Game created.").await;
    refresh_after_action(state, &game_id).await;
    reload_roster(state, &game_id).await;
    Ok(snapshot(state).await)
}

/// Begin the draw.
pub async fn start(state: &SharedState) -> Result<ConsoleSnapshot, ServiceError> {
    report(state, start_game(state).await)
}

async fn start_game(state: &SharedState) -> Result<ConsoleSnapshot, ServiceError> {
    let game_id = ensure_allowed(state, SessionAction::Start).await?;
    state.transport().start(&game_id).await?;
    info!(game_id = %game_id, "game started");

    record_action(state, "Game started.").await;
    refresh_after_action(state, &game_id).await;
    Ok(snapshot(state).await)
}

/// Draw the next number.
pub async fn roll(state: &SharedState) -> Result<ConsoleSnapshot, ServiceError> {
    report(state, roll_number(state).await)
}

async fn roll_number(state: &SharedState) -> Result<ConsoleSnapshot, ServiceError> {
    let game_id = ensure_allowed(state, SessionAction::Roll).await?;
    let called = state.transport().roll(&game_id).await?;
    info!(game_id = %game_id, number = ?called.last(), "rolled");

    // The refresh records `Called N` in the history.
    refresh_after_action(state, &game_id).await;
    Ok(snapshot(state).await)
}

/// Move to the next win-pattern tier, or end the game after the last one.
pub async fn advance_stage(state: &SharedState) -> Result<AdvanceResponse, ServiceError> {
    report(state, advance(state).await)
}

async fn advance(state: &SharedState) -> Result<AdvanceResponse, ServiceError> {
    let game_id = ensure_allowed(state, SessionAction::AdvanceStage).await?;
    let outcome = state.transport().advance_stage(&game_id).await?;
    info!(game_id = %game_id, ended = outcome.ended, stage = ?outcome.stage, "stage advanced");

    let message = match (&outcome.stage, outcome.ended) {
        (_, true) => "Game ended.".to_string(),
        (Some(stage), false) => format!("Stage advanced to {stage}."),
        (None, false) => "Stage advanced.".to_string(),
    };
    record_action(state, &message).await;
    refresh_after_action(state, &game_id).await;

    Ok(AdvanceResponse {
        ended: outcome.ended,
        stage: outcome.stage,
        snapshot: snapshot(state).await,
    })
}

/// Sell or gift cards, then reload the roster and fetch the buyer's share link.
pub async fn buy(state: &SharedState, request: BuyRequest) -> Result<PurchaseResponse, ServiceError> {
    report(state, purchase(state, request).await)
}

async fn purchase(
    state: &SharedState,
    request: BuyRequest,
) -> Result<PurchaseResponse, ServiceError> {
    request.validate()?;
    let game_id = ensure_allowed(state, SessionAction::Buy).await?;

    let params = PurchaseParams::from(request);
    let owner_name = params.owner_name.clone();
    let (quantity, gift) = (params.quantity, params.gift);
    let cards = state.transport().buy(&game_id, params).await?;
    info!(
        game_id = %game_id,
        owner = %owner_name,
        quantity,
        gift,
        "cards purchased"
    );

    let verb = if gift { "Gifted" } else { "Sold" };
    let noun = if quantity == 1 { "card" } else { "cards" };
    record_action(state, &format!("{verb} {quantity} {noun} to {owner_name}.")).await;
    refresh_after_action(state, &game_id).await;

    reload_roster(state, &game_id).await;
    let share_link = match owner_service::token_for(state, &game_id, &owner_name).await {
        Ok(token) => Some(owner_service::share_link(&state.config().base_url, &token)),
        Err(err) => {
            warn!(game_id = %game_id, owner = %owner_name, error = %err, "share link unavailable");
            None
        }
    };

    Ok(PurchaseResponse {
        owner_name,
        card_ids: cards.into_iter().map(|card| card.card_id).collect(),
        share_link,
        snapshot: snapshot(state).await,
    })
}

/// Add funds to the pot.
pub async fn seed_pot(
    state: &SharedState,
    request: SeedPotRequest,
) -> Result<ConsoleSnapshot, ServiceError> {
    report(state, seed(state, request).await)
}

async fn seed(state: &SharedState, request: SeedPotRequest) -> Result<ConsoleSnapshot, ServiceError> {
    request.validate()?;
    let game_id = ensure_allowed(state, SessionAction::SeedPot).await?;
    state.transport().seed(&game_id, request.amount).await?;
    info!(game_id = %game_id, amount = request.amount, "pot seeded");

    let currency = state
        .store()
        .read_session(|session| session.map(|game| game.currency.clone()))
        .await
        .unwrap_or_default();
    let message = format!("Seeded pot with {} {currency}.", format_amount(request.amount));
    record_action(state, message.trim_end()).await;
    refresh_after_action(state, &game_id).await;
    Ok(snapshot(state).await)
}

/// Toggle service-side call announcements.
pub async fn set_announce_calls(
    state: &SharedState,
    enabled: bool,
) -> Result<ConsoleSnapshot, ServiceError> {
    report(state, announce(state, enabled).await)
}

async fn announce(state: &SharedState, enabled: bool) -> Result<ConsoleSnapshot, ServiceError> {
    let game_id = ensure_allowed(state, SessionAction::Announce).await?;
    let settings = SessionSettings {
        announce_calls: enabled,
    };
    state.transport().update_settings(&game_id, settings).await?;

    let message = if enabled {
        "Call announcements enabled."
    } else {
        "Call announcements disabled."
    };
    record_action(state, message).await;
    refresh_after_action(state, &game_id).await;
    Ok(snapshot(state).await)
}

/// Close the game for good and drop it from the console.
pub async fn close(state: &SharedState) -> Result<ConsoleSnapshot, ServiceError> {
    report(state, close_game(state).await)
}

async fn close_game(state: &SharedState) -> Result<ConsoleSnapshot, ServiceError> {
    let game_id = ensure_allowed(state, SessionAction::Close).await?;
    state.transport().close(&game_id).await?;
    info!(game_id = %game_id, "game closed");

    switch_selection(state, None).await;
    broadcast_status(state, StatusKind::Ok, "Game closed.");
    Ok(broadcast_snapshot(state).await)
}

/// Record whether the console panel is visible; polling is suspended while hidden.
pub fn set_panel_active(state: &SharedState, active: bool) -> bool {
    let changed = state.set_panel_active(active);
    if changed {
        info!(active, "console panel visibility changed");
    }
    changed
}
