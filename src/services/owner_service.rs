use reqwest::Url;
use tracing::{debug, info};
use validator::Validate;

use crate::{
    dto::{
        card::CardView,
        owners::{LinkOwnerRequest, OwnerCardsResponse, OwnerSummary, OwnerTokenResponse},
        validation::validate_owner_name,
    },
    error::ServiceError,
    services::{
        console_events::{broadcast_card, broadcast_roster, broadcast_store_update, record_action, report},
        session_service::require_selection,
    },
    state::{SharedState, game::OwnerClaimStatus},
};

/// Reload the roster of the selected game.
pub async fn load_owners(state: &SharedState) -> Result<Vec<OwnerSummary>, ServiceError> {
    let game_id = report(state, require_selection(state).await)?;
    report(state, reload_owners(state, &game_id).await)
}

/// Fetch the roster of `game_id` and replace the cached one wholesale.
///
/// A roster arriving after the operator switched games is dropped.
pub(crate) async fn reload_owners(
    state: &SharedState,
    game_id: &str,
) -> Result<Vec<OwnerSummary>, ServiceError> {
    let owners = state.transport().owners(game_id).await?;
    if state.store().selected().await.as_deref() != Some(game_id) {
        debug!(game_id = %game_id, "discarding roster for a game that is no longer selected");
        return Ok(Vec::new());
    }

    let count = owners.len();
    state.owners().replace(game_id, owners).await;
    debug!(game_id = %game_id, count, "owner roster replaced");

    let summaries = summaries(state, game_id).await;
    broadcast_roster(state, game_id, &summaries);
    Ok(summaries)
}

/// Cached roster of the selected game, with each owner's claim status.
pub async fn owners(state: &SharedState) -> Vec<OwnerSummary> {
    match state.store().selected().await {
        Some(game_id) => summaries(state, &game_id).await,
        None => Vec::new(),
    }
}

async fn summaries(state: &SharedState, game_id: &str) -> Vec<OwnerSummary> {
    let owners = state.owners().owners(game_id).await;
    state
        .store()
        .read_session(|session| {
            owners
                .into_iter()
                .map(|owner| {
                    let status = session.map_or(OwnerClaimStatus::NoClaim, |game| {
                        game.claim_status_for(&owner.owner_name)
                    });
                    OwnerSummary::new(owner, status)
                })
                .collect()
        })
        .await
}

/// Share-link token of an owner, fetched at most once per game.
pub async fn owner_token(
    state: &SharedState,
    owner_name: &str,
) -> Result<OwnerTokenResponse, ServiceError> {
    report(state, token_response(state, owner_name).await)
}

async fn token_response(
    state: &SharedState,
    owner_name: &str,
) -> Result<OwnerTokenResponse, ServiceError> {
    let owner_name = checked_owner(owner_name)?;
    let game_id = require_selection(state).await?;
    let token = token_for(state, &game_id, &owner_name).await?;
    Ok(OwnerTokenResponse {
        share_link: share_link(&state.config().base_url, &token),
        owner_name,
        token,
    })
}

/// Roster-carried or cached token, otherwise fetched and remembered.
///
/// Concurrent callers for the same owner wait on a single request.
pub(crate) async fn token_for(
    state: &SharedState,
    game_id: &str,
    owner_name: &str,
) -> Result<String, ServiceError> {
    let slot = state.owners().token_slot(game_id, owner_name);
    let token = slot
        .get_or_try_init(|| state.transport().owner_token(game_id, owner_name))
        .await?;
    Ok(token.clone())
}

/// Link an owner can open to follow their cards: `<base>/bingo/owner?token=<token>`.
pub fn share_link(base_url: &str, token: &str) -> String {
    let Ok(mut url) = Url::parse(base_url) else {
        return format!("{}/bingo/owner?token={token}", base_url.trim_end_matches('/'));
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(["bingo", "owner"]);
    }
    url.query_pairs_mut().clear().append_pair("token", token);
    url.to_string()
}

/// Link an owner to an external user, then reload the roster.
pub async fn link_owner(
    state: &SharedState,
    owner_name: &str,
    request: LinkOwnerRequest,
) -> Result<Vec<OwnerSummary>, ServiceError> {
    report(state, link(state, owner_name, request).await)
}

async fn link(
    state: &SharedState,
    owner_name: &str,
    request: LinkOwnerRequest,
) -> Result<Vec<OwnerSummary>, ServiceError> {
    request.validate()?;
    let owner_name = checked_owner(owner_name)?;
    let game_id = require_selection(state).await?;

    state
        .transport()
        .link_owner(&game_id, &owner_name, request.user_id)
        .await?;
    info!(game_id = %game_id, owner = %owner_name, user_id = request.user_id, "owner linked");

    record_action(state, &format!("Linked {owner_name}.")).await;
    reload_owners(state, &game_id).await
}

/// Fetch an owner's cards together with the session and derive their display state.
///
/// If the inspected card is among them, the local copy is replaced by the service's.
pub async fn owner_cards(
    state: &SharedState,
    owner_name: &str,
) -> Result<OwnerCardsResponse, ServiceError> {
    report(state, cards_of(state, owner_name).await)
}

async fn cards_of(
    state: &SharedState,
    owner_name: &str,
) -> Result<OwnerCardsResponse, ServiceError> {
    let owner_name = checked_owner(owner_name)?;
    let game_id = require_selection(state).await?;

    let transport = state.transport();
    let (session, cards) = tokio::join!(
        transport.fetch_session(&game_id),
        transport.owner_cards(&game_id, &owner_name)
    );
    let (session, cards) = (session?, cards?);

    let header = session.header_text.clone();
    let called = session.called.clone();
    let claim_status = session.claim_status_for(&owner_name);
    if let Some(update) = state.store().apply_refresh(&game_id, session).await {
        broadcast_store_update(state, update).await;
    }

    {
        let mut inspected = state.inspected().write().await;
        if let Some(current) = inspected.as_mut().filter(|current| current.game_id == game_id) {
            if let Some(fresh) = cards.iter().find(|card| card.card_id == current.card.card_id) {
                current.card = fresh.clone();
                current.owner_name = owner_name.clone();
                broadcast_card(state, &CardView::inspected(current, &header, &called));
            }
        }
    }

    let views = cards
        .iter()
        .map(|card| CardView::build(card, Some(&owner_name), &header, &called))
        .collect();
    Ok(OwnerCardsResponse {
        owner_name,
        claim_status: claim_status.into(),
        cards: views,
    })
}

fn checked_owner(owner_name: &str) -> Result<String, ServiceError> {
    validate_owner_name(owner_name).map_err(|err| {
        ServiceError::InvalidInput(
            err.message
                .map(|message| message.to_string())
                .unwrap_or_else(|| "Owner name is required.".into()),
        )
    })?;
    Ok(owner_name.trim().to_string())
}
