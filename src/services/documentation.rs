use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the bingo operator console.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::console_stream,
        crate::routes::console::list_games,
        crate::routes::console::create_game,
        crate::routes::console::select_game,
        crate::routes::console::get_session,
        crate::routes::console::refresh_session,
        crate::routes::console::start_game,
        crate::routes::console::roll_number,
        crate::routes::console::advance_stage,
        crate::routes::console::buy_cards,
        crate::routes::console::seed_pot,
        crate::routes::console::set_announce_calls,
        crate::routes::console::close_game,
        crate::routes::console::approve_claim,
        crate::routes::console::deny_claim,
        crate::routes::console::set_panel_view,
        crate::routes::console::inspect_card,
        crate::routes::console::get_inspected_card,
        crate::routes::console::mark_number,
        crate::routes::owners::list_owners,
        crate::routes::owners::reload_owners,
        crate::routes::owners::owner_token,
        crate::routes::owners::owner_cards,
        crate::routes::owners::link_owner,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::ConsoleSnapshot,
            crate::dto::session::SessionSummary,
            crate::dto::session::GameListItem,
            crate::dto::session::SelectGameRequest,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::BuyRequest,
            crate::dto::session::SeedPotRequest,
            crate::dto::session::AnnounceRequest,
            crate::dto::session::PanelRequest,
            crate::dto::session::PurchaseResponse,
            crate::dto::session::AdvanceResponse,
            crate::dto::card::CardView,
            crate::dto::card::InspectCardRequest,
            crate::dto::card::MarkRequest,
            crate::dto::card::MarkResponse,
            crate::dto::claims::ClaimResolutionResponse,
            crate::dto::owners::OwnerSummary,
            crate::dto::owners::OwnerTokenResponse,
            crate::dto::owners::OwnerCardsResponse,
            crate::dto::owners::LinkOwnerRequest,
            crate::dto::sse::Handshake,
            crate::dto::sse::StatusEvent,
            crate::dto::sse::CalledEvent,
            crate::dto::sse::ResetEvent,
            crate::dto::sse::HistoryEvent,
            crate::dto::sse::RosterEvent,
            crate::dto::sse::ClaimResolvedEvent,
            crate::dto::sse::AuthExpiredEvent,
            crate::dto::sse::SystemStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "session", description = "Game selection and lifecycle actions"),
        (name = "claims", description = "Claim resolution"),
        (name = "cards", description = "Card inspection and marking"),
        (name = "owners", description = "Ticket holders"),
    )
)]
pub struct ApiDoc;
