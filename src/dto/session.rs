use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{
        format_amount, format_system_time,
        phase::{VisibleAction, VisibleClaimStatus, VisibleSessionPhase},
        validation::{validate_owner_name, validate_theme_color},
    },
    state::{
        game::{Claim, GameListing, GameSession},
        lifecycle::{SessionAction, SessionPhase, is_permitted},
        store::{HistoryEntry, StoreSnapshot},
    },
    transport::{CreateSessionParams, PurchaseParams},
};

const DEFAULT_TITLE: &str = "Bingo";
const DEFAULT_CURRENCY: &str = "gil";

/// Everything a console UI needs to render the selected game.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConsoleSnapshot {
    /// Game currently selected, even before its first snapshot arrives.
    pub selected_game_id: Option<String>,
    pub phase: VisibleSessionPhase,
    /// Status badge text, e.g. `Stage Complete`.
    pub phase_label: String,
    /// Action the UI should emphasise.
    pub primary_action: Option<VisibleAction>,
    pub actions: ActionAvailability,
    pub session: Option<SessionSummary>,
    /// Newest-first call and action history.
    pub history: Vec<HistoryEntryView>,
    pub last_action: Option<String>,
}

impl From<StoreSnapshot> for ConsoleSnapshot {
    fn from(snapshot: StoreSnapshot) -> Self {
        let session = snapshot.session.as_ref();
        let phase = SessionPhase::of(session);
        let visible: VisibleSessionPhase = phase.into();
        Self {
            selected_game_id: snapshot.selected,
            phase: visible,
            phase_label: visible.label().to_string(),
            primary_action: phase.primary_action().map(Into::into),
            actions: ActionAvailability::for_session(session),
            session: snapshot.session.map(SessionSummary::from),
            history: snapshot
                .history
                .into_iter()
                .map(HistoryEntryView::from)
                .collect(),
            last_action: snapshot.last_action,
        }
    }
}

/// Which operator actions the lifecycle currently permits.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct ActionAvailability {
    pub create: bool,
    pub start: bool,
    pub roll: bool,
    pub advance: bool,
    pub resolve_claim: bool,
    pub buy: bool,
    pub seed_pot: bool,
    pub mark: bool,
    pub announce: bool,
    pub close: bool,
}

impl ActionAvailability {
    /// Evaluate every action against a snapshot.
    pub fn for_session(session: Option<&GameSession>) -> Self {
        let allowed = |action| is_permitted(session, action);
        Self {
            create: allowed(SessionAction::Create),
            start: allowed(SessionAction::Start),
            roll: allowed(SessionAction::Roll),
            advance: allowed(SessionAction::AdvanceStage),
            resolve_claim: allowed(SessionAction::ResolveClaim),
            buy: allowed(SessionAction::Buy),
            seed_pot: allowed(SessionAction::SeedPot),
            mark: allowed(SessionAction::Mark),
            announce: allowed(SessionAction::Announce),
            close: allowed(SessionAction::Close),
        }
    }
}

/// Read-only view of a [`GameSession`].
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    pub game_id: String,
    pub title: String,
    /// Always exactly four characters.
    pub header_text: String,
    pub stage: String,
    pub pot: i64,
    /// Pot with thousands separators and currency, e.g. `1.500 gil`.
    pub pot_display: String,
    pub currency: String,
    pub active: bool,
    pub started: bool,
    pub announce_calls: bool,
    pub theme_color: Option<String>,
    pub background: Option<String>,
    pub called: Vec<u32>,
    pub last_called: Option<u32>,
    /// Newest claim first.
    pub claims: Vec<ClaimView>,
    pub price: i64,
    pub max_cards_per_player: u32,
    pub payouts: PayoutsView,
    pub stats: StatsView,
}

impl From<GameSession> for SessionSummary {
    fn from(session: GameSession) -> Self {
        let last_called = session.latest_call();
        let pot_display = format!("{} {}", format_amount(session.pot), session.currency)
            .trim_end()
            .to_string();
        Self {
            last_called,
            pot_display,
            claims: session.claims.iter().rev().map(ClaimView::from).collect(),
            payouts: PayoutsView {
                single: session.payouts.single,
                double: session.payouts.double,
                full: session.payouts.full,
            },
            stats: StatsView {
                cards: session.stats.cards,
                players: session.stats.players,
            },
            game_id: session.game_id,
            title: session.title,
            header_text: session.header_text,
            stage: session.stage,
            pot: session.pot,
            currency: session.currency,
            active: session.active,
            started: session.started,
            announce_calls: session.announce_calls,
            theme_color: session.theme_color,
            background: session.background,
            called: session.called,
            price: session.price,
            max_cards_per_player: session.max_cards_per_player,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct PayoutsView {
    pub single: i64,
    pub double: i64,
    pub full: i64,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct StatsView {
    pub cards: u32,
    pub players: u32,
}

/// One claim as shown in the claims list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimView {
    pub owner_name: String,
    pub card_id: String,
    pub stage: String,
    pub status: VisibleClaimStatus,
    pub ts: Option<f64>,
    pub source: Option<String>,
}

impl From<&Claim> for ClaimView {
    fn from(claim: &Claim) -> Self {
        Self {
            owner_name: claim.owner_name.clone(),
            card_id: claim.card_id.clone(),
            stage: claim.stage.clone(),
            status: claim.state().into(),
            ts: claim.ts,
            source: claim.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntryView {
    /// RFC 3339 timestamp.
    pub at: String,
    pub message: String,
}

impl From<HistoryEntry> for HistoryEntryView {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            at: format_system_time(entry.at),
            message: entry.message,
        }
    }
}

/// Entry of the game picker.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameListItem {
    pub game_id: String,
    pub title: String,
    pub created_at: Option<f64>,
    pub active: bool,
    pub stage: String,
    pub pot: i64,
}

impl From<GameListing> for GameListItem {
    fn from(listing: GameListing) -> Self {
        Self {
            game_id: listing.game_id,
            title: listing.title,
            created_at: listing.created_at,
            active: listing.active,
            stage: listing.stage,
            pot: listing.pot,
        }
    }
}

/// Select the game to view; `null` clears the selection.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectGameRequest {
    #[serde(default)]
    pub game_id: Option<String>,
}

/// Settings for a new game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub header_text: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Price cannot be negative."))]
    pub price: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default = "default_max_cards")]
    #[validate(range(min = 1, message = "Max cards per player must be at least 1."))]
    pub max_cards_per_player: u32,
    #[serde(default)]
    #[validate(range(min = 0, message = "Seed pot cannot be negative."))]
    pub seed_pot: i64,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub announce_calls: bool,
    #[serde(default)]
    #[validate(custom(function = "validate_theme_color"))]
    pub theme_color: Option<String>,
}

fn default_max_cards() -> u32 {
    10
}

fn default_quantity() -> u32 {
    1
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl From<CreateSessionRequest> for CreateSessionParams {
    fn from(request: CreateSessionRequest) -> Self {
        CreateSessionParams {
            title: trimmed(request.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            header_text: trimmed(request.header_text).unwrap_or_default(),
            price: request.price,
            currency: trimmed(request.currency).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            max_cards_per_player: request.max_cards_per_player,
            seed_pot: request.seed_pot,
            channel_id: trimmed(request.channel_id),
            created_by: trimmed(request.created_by),
            announce_calls: request.announce_calls,
            theme_color: trimmed(request.theme_color),
        }
    }
}

/// Sell or gift cards to an owner.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BuyRequest {
    #[validate(custom(function = "validate_owner_name"))]
    pub owner_name: String,
    #[serde(default)]
    pub owner_user_id: Option<String>,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, message = "Quantity must be at least 1."))]
    pub quantity: u32,
    /// Gifted cards do not feed the pot.
    #[serde(default)]
    pub gift: bool,
}

impl From<BuyRequest> for PurchaseParams {
    fn from(request: BuyRequest) -> Self {
        PurchaseParams {
            owner_name: request.owner_name.trim().to_string(),
            owner_user_id: trimmed(request.owner_user_id),
            quantity: request.quantity,
            gift: request.gift,
        }
    }
}

/// Add funds to the pot.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SeedPotRequest {
    #[validate(range(min = 1, message = "Seed amount must be greater than zero."))]
    pub amount: i64,
}

/// Toggle service-side call announcements.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnnounceRequest {
    pub enabled: bool,
}

/// Report whether the console panel is visible.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PanelRequest {
    pub active: bool,
}

/// Result of a purchase.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseResponse {
    pub owner_name: String,
    /// Identifiers of the cards created by the purchase.
    pub card_ids: Vec<String>,
    /// Share link for the owner, when the token could be fetched.
    pub share_link: Option<String>,
    pub snapshot: ConsoleSnapshot,
}

/// Result of a stage advance.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdvanceResponse {
    /// The advance ended the game rather than moving to another stage.
    pub ended: bool,
    pub stage: Option<String>,
    pub snapshot: ConsoleSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::fixtures::{claim, session};
    use validator::Validate;

    #[test]
    fn snapshot_without_session_has_no_primary_action() {
        let snapshot = ConsoleSnapshot::from(StoreSnapshot::default());
        assert_eq!(snapshot.phase, VisibleSessionPhase::NoSession);
        assert_eq!(snapshot.primary_action, None);
        assert!(snapshot.actions.create);
        assert!(!snapshot.actions.roll);
    }

    #[test]
    fn summary_lists_newest_claim_first() {
        let mut game = session("g1");
        game.pot = 12_500;
        game.claims = vec![claim("A", "c1", false, true), claim("B", "c2", true, false)];

        let summary = SessionSummary::from(game);
        assert_eq!(summary.pot_display, "12.500 gil");
        assert_eq!(summary.claims[0].card_id, "c2");
        assert_eq!(summary.claims[0].status, VisibleClaimStatus::Pending);
        assert_eq!(summary.claims[1].status, VisibleClaimStatus::Denied);
    }

    #[test]
    fn buy_request_validation_messages() {
        let request = BuyRequest {
            owner_name: "  ".into(),
            owner_user_id: None,
            quantity: 2,
            gift: false,
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(
            crate::dto::validation::first_message(&errors),
            "Owner name is required."
        );

        let request = BuyRequest {
            owner_name: "Amy".into(),
            owner_user_id: None,
            quantity: 0,
            gift: false,
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(
            crate::dto::validation::first_message(&errors),
            "Quantity must be at least 1."
        );
    }

    #[test]
    fn seed_amount_must_be_positive() {
        assert!(SeedPotRequest { amount: 0 }.validate().is_err());
        assert!(SeedPotRequest { amount: 500 }.validate().is_ok());
    }
}
