//! Parameter and result types exchanged with [`SessionTransport`](super::SessionTransport).

/// Settings for a new game.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSessionParams {
    /// Display title.
    pub title: String,
    /// Raw header; normalised by the service and again on read.
    pub header_text: String,
    /// Ticket price.
    pub price: i64,
    /// Currency label.
    pub currency: String,
    /// Per-owner ticket cap.
    pub max_cards_per_player: u32,
    /// Initial pot.
    pub seed_pot: i64,
    /// Channel the game announces to, when any.
    pub channel_id: Option<String>,
    /// Operator creating the game.
    pub created_by: Option<String>,
    /// Whether the service announces calls.
    pub announce_calls: bool,
    /// Optional hex accent color.
    pub theme_color: Option<String>,
}

/// Card purchase for one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseParams {
    /// Owner display name.
    pub owner_name: String,
    /// External user id of the owner, when known.
    pub owner_user_id: Option<String>,
    /// Number of cards to buy.
    pub quantity: u32,
    /// Free cards that do not feed the pot.
    pub gift: bool,
}

/// Mutable settings of a running game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Whether the service announces calls.
    pub announce_calls: bool,
}

/// Result of a stage advance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdvanceOutcome {
    /// `true` when the advance ended the game instead of moving to another stage.
    pub ended: bool,
    /// New stage, when the service reports it.
    pub stage: Option<String>,
}
