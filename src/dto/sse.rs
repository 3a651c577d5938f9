use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{
    card::CardView, claims::ClaimOutcome, owners::OwnerSummary, session::HistoryEntryView,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the last refresh failed.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the console enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Severity of a status message.
pub enum StatusKind {
    Ok,
    Err,
}

#[derive(Debug, Serialize, ToSchema)]
/// Operator-facing status line; errors carry the service's message verbatim.
pub struct StatusEvent {
    pub kind: StatusKind,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the most recent call changes.
pub struct CalledEvent {
    pub game_id: String,
    pub number: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once per game switch after history was cleared.
pub struct ResetEvent {
    pub game_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Current history, newest first.
pub struct HistoryEvent {
    pub entries: Vec<HistoryEntryView>,
    pub last_action: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after the roster was reloaded.
pub struct RosterEvent {
    pub game_id: String,
    pub owners: Vec<OwnerSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the inspected card changes.
pub struct CardUpdatedEvent(pub CardView);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once a claim resolution completed.
pub struct ClaimResolvedEvent {
    pub game_id: String,
    pub card_id: String,
    pub outcome: ClaimOutcome,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the game service refused the operator's credentials.
pub struct AuthExpiredEvent {
    pub message: String,
}
