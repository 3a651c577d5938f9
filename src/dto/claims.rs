use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::session::ConsoleSnapshot;

/// How a claim resolution ended.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClaimOutcome {
    /// Approved; the game moved to the next stage.
    StageAdvanced,
    /// Approved; the final stage was won and the game ended.
    GameEnded,
    /// Denied; the game continues in the same stage.
    Denied,
}

impl ClaimOutcome {
    /// Operator-facing description.
    pub fn message(self) -> &'static str {
        match self {
            ClaimOutcome::StageAdvanced => "Claim approved. Stage advanced.",
            ClaimOutcome::GameEnded => "Claim approved. Game ended.",
            ClaimOutcome::Denied => "Claim denied.",
        }
    }
}

/// Result of approving or denying a claim.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClaimResolutionResponse {
    pub card_id: String,
    pub outcome: ClaimOutcome,
    pub message: String,
    /// State after the forced refresh.
    pub snapshot: ConsoleSnapshot,
}
