use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::{
        card::{CardView, InspectCardRequest, MarkRequest, MarkResponse},
        claims::ClaimResolutionResponse,
        session::{
            AdvanceResponse, AnnounceRequest, BuyRequest, ConsoleSnapshot, CreateSessionRequest,
            GameListItem, PanelRequest, PurchaseResponse, SeedPotRequest, SelectGameRequest,
        },
    },
    error::AppError,
    services::{claim_service, marking_service, session_service},
    state::SharedState,
};

/// Operator routes driving the selected game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/console/games", get(list_games).post(create_game))
        .route("/console/select", post(select_game))
        .route("/console/session", get(get_session).delete(close_game))
        .route("/console/session/refresh", post(refresh_session))
        .route("/console/session/start", post(start_game))
        .route("/console/session/roll", post(roll_number))
        .route("/console/session/advance", post(advance_stage))
        .route("/console/session/buy", post(buy_cards))
        .route("/console/session/seed", post(seed_pot))
        .route("/console/session/announce", post(set_announce_calls))
        .route("/console/claims/{card_id}/approve", post(approve_claim))
        .route("/console/claims/{card_id}/deny", post(deny_claim))
        .route("/console/view", post(set_panel_view))
        .route("/console/card", get(get_inspected_card))
        .route("/console/card/inspect", post(inspect_card))
        .route("/console/card/mark", post(mark_number))
}

/// List the games known to the game service.
#[utoipa::path(
    get,
    path = "/console/games",
    tag = "session",
    responses(
        (status = 200, description = "Known games", body = [GameListItem]),
        (status = 502, description = "Game service failure")
    )
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameListItem>>, AppError> {
    let games = session_service::list_games(&state).await?;
    Ok(Json(games))
}

/// Create a game and select it.
#[utoipa::path(
    post,
    path = "/console/games",
    tag = "session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Game created", body = ConsoleSnapshot),
        (status = 400, description = "Invalid settings"),
        (status = 409, description = "Another game is selected")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = session_service::create_session(&state, payload).await?;
    Ok(Json(snapshot))
}

/// Switch the viewed game; `null` clears the selection.
#[utoipa::path(
    post,
    path = "/console/select",
    tag = "session",
    request_body = SelectGameRequest,
    responses((status = 200, description = "Selection applied", body = ConsoleSnapshot))
)]
pub async fn select_game(
    State(state): State<SharedState>,
    Json(payload): Json<SelectGameRequest>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = session_service::select_game(&state, payload.game_id).await?;
    Ok(Json(snapshot))
}

/// Current console view, without contacting the game service.
#[utoipa::path(
    get,
    path = "/console/session",
    tag = "session",
    responses((status = 200, description = "Current view", body = ConsoleSnapshot))
)]
pub async fn get_session(State(state): State<SharedState>) -> Json<ConsoleSnapshot> {
    Json(session_service::snapshot(&state).await)
}

/// Refresh the selected game now.
#[utoipa::path(
    post,
    path = "/console/session/refresh",
    tag = "session",
    responses(
        (status = 200, description = "Refreshed view", body = ConsoleSnapshot),
        (status = 409, description = "No game selected")
    )
)]
pub async fn refresh_session(
    State(state): State<SharedState>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = session_service::refresh(&state).await?;
    Ok(Json(snapshot))
}

/// Begin the draw.
#[utoipa::path(
    post,
    path = "/console/session/start",
    tag = "session",
    responses(
        (status = 200, description = "Game started", body = ConsoleSnapshot),
        (status = 409, description = "Not waiting to start")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = session_service::start(&state).await?;
    Ok(Json(snapshot))
}

/// Draw the next number.
#[utoipa::path(
    post,
    path = "/console/session/roll",
    tag = "session",
    responses(
        (status = 200, description = "Number drawn", body = ConsoleSnapshot),
        (status = 409, description = "Game is not running")
    )
)]
pub async fn roll_number(
    State(state): State<SharedState>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = session_service::roll(&state).await?;
    Ok(Json(snapshot))
}

/// Advance to the next stage, or end the game after the last one.
#[utoipa::path(
    post,
    path = "/console/session/advance",
    tag = "session",
    responses(
        (status = 200, description = "Stage advanced or game ended", body = AdvanceResponse),
        (status = 409, description = "No stage is complete")
    )
)]
pub async fn advance_stage(
    State(state): State<SharedState>,
) -> Result<Json<AdvanceResponse>, AppError> {
    let response = session_service::advance_stage(&state).await?;
    Ok(Json(response))
}

/// Sell or gift cards to an owner.
#[utoipa::path(
    post,
    path = "/console/session/buy",
    tag = "session",
    request_body = BuyRequest,
    responses(
        (status = 200, description = "Cards purchased", body = PurchaseResponse),
        (status = 400, description = "Invalid purchase"),
        (status = 409, description = "Ticket sales are closed")
    )
)]
pub async fn buy_cards(
    State(state): State<SharedState>,
    Json(payload): Json<BuyRequest>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let response = session_service::buy(&state, payload).await?;
    Ok(Json(response))
}

/// Add funds to the pot.
#[utoipa::path(
    post,
    path = "/console/session/seed",
    tag = "session",
    request_body = SeedPotRequest,
    responses(
        (status = 200, description = "Pot seeded", body = ConsoleSnapshot),
        (status = 400, description = "Invalid amount")
    )
)]
pub async fn seed_pot(
    State(state): State<SharedState>,
    Json(payload): Json<SeedPotRequest>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = session_service::seed_pot(&state, payload).await?;
    Ok(Json(snapshot))
}

/// Toggle service-side call announcements.
#[utoipa::path(
    post,
    path = "/console/session/announce",
    tag = "session",
    request_body = AnnounceRequest,
    responses((status = 200, description = "Setting updated", body = ConsoleSnapshot))
)]
pub async fn set_announce_calls(
    State(state): State<SharedState>,
    Json(payload): Json<AnnounceRequest>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = session_service::set_announce_calls(&state, payload.enabled).await?;
    Ok(Json(snapshot))
}

/// Close the selected game. Irreversible.
#[utoipa::path(
    delete,
    path = "/console/session",
    tag = "session",
    responses(
        (status = 200, description = "Game closed", body = ConsoleSnapshot),
        (status = 409, description = "Game already finished")
    )
)]
pub async fn close_game(
    State(state): State<SharedState>,
) -> Result<Json<ConsoleSnapshot>, AppError> {
    let snapshot = session_service::close(&state).await?;
    Ok(Json(snapshot))
}

/// Approve a pending claim and advance the stage.
#[utoipa::path(
    post,
    path = "/console/claims/{card_id}/approve",
    tag = "claims",
    params(("card_id" = String, Path, description = "Card the claim was raised for")),
    responses(
        (status = 200, description = "Claim approved", body = ClaimResolutionResponse),
        (status = 409, description = "No pending claim or already being resolved")
    )
)]
pub async fn approve_claim(
    State(state): State<SharedState>,
    Path(card_id): Path<String>,
) -> Result<Json<ClaimResolutionResponse>, AppError> {
    let response = claim_service::approve(&state, &card_id).await?;
    Ok(Json(response))
}

/// Deny a pending claim.
#[utoipa::path(
    post,
    path = "/console/claims/{card_id}/deny",
    tag = "claims",
    params(("card_id" = String, Path, description = "Card the claim was raised for")),
    responses(
        (status = 200, description = "Claim denied", body = ClaimResolutionResponse),
        (status = 409, description = "No pending claim or already being resolved")
    )
)]
pub async fn deny_claim(
    State(state): State<SharedState>,
    Path(card_id): Path<String>,
) -> Result<Json<ClaimResolutionResponse>, AppError> {
    let response = claim_service::deny(&state, &card_id).await?;
    Ok(Json(response))
}

/// Report whether the console panel is visible; polling pauses while it is not.
#[utoipa::path(
    post,
    path = "/console/view",
    tag = "session",
    request_body = PanelRequest,
    responses((status = 204, description = "Visibility recorded"))
)]
pub async fn set_panel_view(
    State(state): State<SharedState>,
    Json(payload): Json<PanelRequest>,
) -> StatusCode {
    session_service::set_panel_active(&state, payload.active);
    StatusCode::NO_CONTENT
}

/// Load a card for inspection.
#[utoipa::path(
    post,
    path = "/console/card/inspect",
    tag = "cards",
    request_body = InspectCardRequest,
    responses(
        (status = 200, description = "Card loaded", body = CardView),
        (status = 404, description = "Card not found")
    )
)]
pub async fn inspect_card(
    State(state): State<SharedState>,
    Json(payload): Json<InspectCardRequest>,
) -> Result<Json<CardView>, AppError> {
    let view = marking_service::inspect_card(&state, payload).await?;
    Ok(Json(view))
}

/// The card currently loaded for inspection.
#[utoipa::path(
    get,
    path = "/console/card",
    tag = "cards",
    responses(
        (status = 200, description = "Inspected card", body = CardView),
        (status = 404, description = "No card loaded")
    )
)]
pub async fn get_inspected_card(
    State(state): State<SharedState>,
) -> Result<Json<CardView>, AppError> {
    marking_service::inspected_card(&state)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No card is being inspected.".into()))
}

/// Mark every cell of the inspected card holding a number.
#[utoipa::path(
    post,
    path = "/console/card/mark",
    tag = "cards",
    request_body = MarkRequest,
    responses(
        (status = 200, description = "Cells marked, possibly partially", body = MarkResponse),
        (status = 400, description = "Number is not on the card"),
        (status = 409, description = "Marking not allowed in this phase")
    )
)]
pub async fn mark_number(
    State(state): State<SharedState>,
    Json(payload): Json<MarkRequest>,
) -> Result<Json<MarkResponse>, AppError> {
    let response = marking_service::mark_number(&state, payload.number).await?;
    Ok(Json(response))
}
