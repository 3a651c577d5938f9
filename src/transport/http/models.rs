use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};

use crate::{
    state::game::{
        Card, Claim, DEFAULT_STAGE, GameListing, GameSession, GameStats, Owner, Payouts, XivLink,
        normalize_header,
    },
    transport::{AdvanceOutcome, CreateSessionParams, PurchaseParams, TransportError},
};

pub const GAME_NOT_FOUND: &str = "game not found";

fn default_true() -> bool {
    true
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Generic acknowledgement carried by every response.
#[derive(Debug, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    /// Human-readable failure reported by the service, if any.
    pub fn into_message(self) -> Option<String> {
        non_empty(self.error).or_else(|| non_empty(self.message))
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionEnvelope {
    #[serde(default)]
    pub game: Option<WireGame>,
    #[serde(default)]
    pub stats: Option<WireStats>,
}

impl SessionEnvelope {
    pub fn into_session(self) -> Result<GameSession, TransportError> {
        let game = self
            .game
            .ok_or_else(|| TransportError::NotFound(GAME_NOT_FOUND.into()))?;
        Ok(game.into_session(self.stats))
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct WireGame {
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub header_text: Option<String>,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub pot: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub started: bool,
    #[serde(default)]
    pub announce_calls: bool,
    #[serde(default)]
    pub theme_color: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub called: Vec<u32>,
    #[serde(default)]
    pub last_called: Option<u32>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub claims: Vec<WireClaim>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub price: i64,
    #[serde(default)]
    pub max_cards_per_player: u32,
    #[serde(default)]
    pub payouts: Option<WirePayouts>,
}

impl WireGame {
    pub fn into_session(self, stats: Option<WireStats>) -> GameSession {
        let header = non_empty(self.header_text).or_else(|| non_empty(self.header));
        GameSession {
            game_id: self.game_id,
            title: self.title,
            header_text: normalize_header(header.as_deref()),
            stage: non_empty(self.stage).unwrap_or_else(|| DEFAULT_STAGE.to_string()),
            pot: self.pot,
            currency: self.currency,
            active: self.active,
            started: self.started,
            announce_calls: self.announce_calls,
            theme_color: non_empty(self.theme_color),
            background: non_empty(self.background),
            called: self.called,
            last_called: self.last_called,
            claims: self.claims.into_iter().map(Claim::from).collect(),
            price: self.price,
            max_cards_per_player: self.max_cards_per_player,
            payouts: self.payouts.map(Payouts::from).unwrap_or_default(),
            stats: stats.map(GameStats::from).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireClaim {
    #[serde(default)]
    pub ts: Option<f64>,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub card_id: String,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub denied: bool,
    #[serde(default)]
    pub source: Option<String>,
}

impl From<WireClaim> for Claim {
    fn from(claim: WireClaim) -> Self {
        Claim {
            owner_name: claim.owner_name,
            card_id: claim.card_id,
            stage: non_empty(claim.stage).unwrap_or_else(|| DEFAULT_STAGE.to_string()),
            pending: claim.pending,
            denied: claim.denied,
            ts: claim.ts,
            source: non_empty(claim.source),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WirePayouts {
    #[serde(default)]
    pub single: i64,
    #[serde(default)]
    pub double: i64,
    #[serde(default)]
    pub full: i64,
}

impl From<WirePayouts> for Payouts {
    fn from(payouts: WirePayouts) -> Self {
        Payouts {
            single: payouts.single,
            double: payouts.double,
            full: payouts.full,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WireStats {
    #[serde(default)]
    pub cards: u32,
    #[serde(default)]
    pub players: u32,
}

impl From<WireStats> for GameStats {
    fn from(stats: WireStats) -> Self {
        GameStats {
            cards: stats.cards,
            players: stats.players,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct WireCard {
    pub card_id: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub numbers: Vec<Vec<u32>>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub marks: Vec<Vec<bool>>,
}

impl From<WireCard> for Card {
    fn from(card: WireCard) -> Self {
        Card::new(card.card_id, card.numbers, card.marks)
    }
}

#[derive(Debug, Deserialize)]
pub struct WireOwner {
    pub owner_name: String,
    #[serde(default)]
    pub cards: u32,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub last_purchase: Option<f64>,
    #[serde(default)]
    pub xiv_username: Option<String>,
    #[serde(default)]
    pub xiv_world: Option<String>,
}

impl From<WireOwner> for Owner {
    fn from(owner: WireOwner) -> Self {
        let xiv = non_empty(owner.xiv_username).map(|username| XivLink {
            username,
            world: non_empty(owner.xiv_world),
        });
        Owner {
            owner_name: owner.owner_name,
            cards: owner.cards,
            token: non_empty(owner.token),
            last_purchase: owner.last_purchase,
            xiv,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireListing {
    pub game_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: Option<f64>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub pot: i64,
}

impl From<WireListing> for GameListing {
    fn from(listing: WireListing) -> Self {
        GameListing {
            game_id: listing.game_id,
            title: listing.title,
            created_at: listing.created_at,
            active: listing.active,
            stage: non_empty(listing.stage).unwrap_or_else(|| DEFAULT_STAGE.to_string()),
            pot: listing.pot,
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct GamesResponse {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub games: Vec<WireListing>,
}

#[derive(Debug, Deserialize)]
pub struct CreateResponse {
    #[serde(default)]
    pub game: Option<WireGame>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct RollResponse {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub called: Vec<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceResponse {
    #[serde(default)]
    pub ended: bool,
    #[serde(default)]
    pub stage: Option<String>,
}

impl From<AdvanceResponse> for AdvanceOutcome {
    fn from(response: AdvanceResponse) -> Self {
        AdvanceOutcome {
            ended: response.ended,
            stage: non_empty(response.stage),
        }
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct CardsResponse {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub cards: Vec<WireCard>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub struct OwnersResponse {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub owners: Vec<WireOwner>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GameIdBody<'a> {
    pub game_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CardActionBody<'a> {
    pub game_id: &'a str,
    pub card_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MarkBody<'a> {
    pub game_id: &'a str,
    pub card_id: &'a str,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Serialize)]
pub struct SeedBody<'a> {
    pub game_id: &'a str,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct BuyBody<'a> {
    pub game_id: &'a str,
    pub owner_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<&'a str>,
    pub quantity: u32,
    pub gift: bool,
}

impl<'a> BuyBody<'a> {
    pub fn new(game_id: &'a str, params: &'a PurchaseParams) -> Self {
        Self {
            game_id,
            owner_name: &params.owner_name,
            owner_user_id: params.owner_user_id.as_deref(),
            quantity: params.quantity,
            gift: params.gift,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateBody<'a> {
    pub title: &'a str,
    pub header_text: &'a str,
    pub price: i64,
    pub currency: &'a str,
    pub max_cards_per_player: u32,
    pub seed_pot: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<&'a str>,
    pub announce_calls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<&'a str>,
}

impl<'a> From<&'a CreateSessionParams> for CreateBody<'a> {
    fn from(params: &'a CreateSessionParams) -> Self {
        Self {
            title: &params.title,
            header_text: &params.header_text,
            price: params.price,
            currency: &params.currency,
            max_cards_per_player: params.max_cards_per_player,
            seed_pot: params.seed_pot,
            channel_id: params.channel_id.as_deref(),
            created_by: params.created_by.as_deref(),
            announce_calls: params.announce_calls,
            theme_color: params.theme_color.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsBody {
    pub announce_calls: bool,
}

#[derive(Debug, Serialize)]
pub struct LinkBody {
    pub user_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_without_game_is_not_found() {
        let envelope: SessionEnvelope = serde_json::from_str(r#"{"active": false}"#).unwrap();
        match envelope.into_session() {
            Err(TransportError::NotFound(message)) => assert_eq!(message, GAME_NOT_FOUND),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn session_payload_tolerates_nulls_and_legacy_header() {
        let payload = r#"{
            "active": true,
            "game": {
                "game_id": "g1",
                "title": "Friday",
                "header": "lotto",
                "stage": null,
                "pot": 1500,
                "currency": "gil",
                "called": null,
                "claims": [{"owner_name": "A", "card_id": "c1", "pending": true, "ts": 12.5}],
                "payouts": {"single": 10, "double": 20, "full": 70}
            },
            "stats": {"cards": 3, "players": 2}
        }"#;

        let envelope: SessionEnvelope = serde_json::from_str(payload).unwrap();
        let session = envelope.into_session().unwrap();

        assert_eq!(session.header_text, "LOTT");
        assert_eq!(session.stage, DEFAULT_STAGE);
        assert!(session.called.is_empty());
        assert!(session.active);
        assert!(!session.started);
        assert_eq!(session.claims.len(), 1);
        assert!(session.claims[0].pending);
        assert_eq!(session.payouts.full, 70);
        assert_eq!(session.stats.players, 2);
    }

    #[test]
    fn owner_link_requires_username() {
        let owner: WireOwner =
            serde_json::from_str(r#"{"owner_name": "A", "cards": 2, "xiv_world": "Odin"}"#)
                .unwrap();
        let owner = Owner::from(owner);
        assert!(owner.xiv.is_none());
        assert_eq!(owner.cards, 2);
    }

    #[test]
    fn ack_prefers_error_over_message() {
        let ack: Ack =
            serde_json::from_str(r#"{"ok": false, "error": "", "message": "Game is closed"}"#)
                .unwrap();
        assert_eq!(ack.into_message().as_deref(), Some("Game is closed"));
    }
}
