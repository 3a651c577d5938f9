use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::owners::{LinkOwnerRequest, OwnerCardsResponse, OwnerSummary, OwnerTokenResponse},
    error::AppError,
    services::owner_service,
    state::SharedState,
};

/// Routes exposing the selected game's ticket holders.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/console/owners", get(list_owners))
        .route("/console/owners/refresh", post(reload_owners))
        .route("/console/owners/{owner_name}/token", get(owner_token))
        .route("/console/owners/{owner_name}/cards", get(owner_cards))
        .route("/console/owners/{owner_name}/link", post(link_owner))
}

/// Cached roster of the selected game.
#[utoipa::path(
    get,
    path = "/console/owners",
    tag = "owners",
    responses((status = 200, description = "Cached roster", body = [OwnerSummary]))
)]
pub async fn list_owners(State(state): State<SharedState>) -> Json<Vec<OwnerSummary>> {
    Json(owner_service::owners(&state).await)
}

/// Reload the roster from the game service.
#[utoipa::path(
    post,
    path = "/console/owners/refresh",
    tag = "owners",
    responses(
        (status = 200, description = "Fresh roster", body = [OwnerSummary]),
        (status = 409, description = "No game selected")
    )
)]
pub async fn reload_owners(
    State(state): State<SharedState>,
) -> Result<Json<Vec<OwnerSummary>>, AppError> {
    let owners = owner_service::load_owners(&state).await?;
    Ok(Json(owners))
}

/// Share-link token of an owner.
#[utoipa::path(
    get,
    path = "/console/owners/{owner_name}/token",
    tag = "owners",
    params(("owner_name" = String, Path, description = "Ticket holder")),
    responses((status = 200, description = "Owner token", body = OwnerTokenResponse))
)]
pub async fn owner_token(
    State(state): State<SharedState>,
    Path(owner_name): Path<String>,
) -> Result<Json<OwnerTokenResponse>, AppError> {
    let response = owner_service::owner_token(&state, &owner_name).await?;
    Ok(Json(response))
}

/// Cards of an owner with their display state.
#[utoipa::path(
    get,
    path = "/console/owners/{owner_name}/cards",
    tag = "owners",
    params(("owner_name" = String, Path, description = "Ticket holder")),
    responses((status = 200, description = "Owner cards", body = OwnerCardsResponse))
)]
pub async fn owner_cards(
    State(state): State<SharedState>,
    Path(owner_name): Path<String>,
) -> Result<Json<OwnerCardsResponse>, AppError> {
    let response = owner_service::owner_cards(&state, &owner_name).await?;
    Ok(Json(response))
}

/// Link an owner to an external user.
#[utoipa::path(
    post,
    path = "/console/owners/{owner_name}/link",
    tag = "owners",
    params(("owner_name" = String, Path, description = "Ticket holder")),
    request_body = LinkOwnerRequest,
    responses((status = 200, description = "Roster after linking", body = [OwnerSummary]))
)]
pub async fn link_owner(
    State(state): State<SharedState>,
    Path(owner_name): Path<String>,
    Json(payload): Json<LinkOwnerRequest>,
) -> Result<Json<Vec<OwnerSummary>>, AppError> {
    let owners = owner_service::link_owner(&state, &owner_name, payload).await?;
    Ok(Json(owners))
}
