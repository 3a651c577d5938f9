use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{
    game::{ClaimState, OwnerClaimStatus},
    lifecycle::{SessionAction, SessionPhase},
};

/// Session phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleSessionPhase {
    /// No game selected.
    NoSession,
    /// Waiting for the operator to start the draw.
    WaitingToStart,
    /// Numbers are being drawn.
    Running,
    /// A claim awaits resolution.
    StageComplete,
    /// The game is closed.
    Finished,
}

impl VisibleSessionPhase {
    /// Label shown in the status badge.
    pub fn label(self) -> &'static str {
        match self {
            VisibleSessionPhase::NoSession => "No Game Selected",
            VisibleSessionPhase::WaitingToStart => "Waiting to Start",
            VisibleSessionPhase::Running => "Running",
            VisibleSessionPhase::StageComplete => "Stage Complete",
            VisibleSessionPhase::Finished => "Finished",
        }
    }
}

impl From<SessionPhase> for VisibleSessionPhase {
    fn from(value: SessionPhase) -> Self {
        match value {
            SessionPhase::NoSession => VisibleSessionPhase::NoSession,
            SessionPhase::WaitingToStart => VisibleSessionPhase::WaitingToStart,
            SessionPhase::Running => VisibleSessionPhase::Running,
            SessionPhase::StageComplete => VisibleSessionPhase::StageComplete,
            SessionPhase::Finished => VisibleSessionPhase::Finished,
        }
    }
}

/// Operator action names exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleAction {
    Create,
    Start,
    Roll,
    Advance,
    ResolveClaim,
    Buy,
    SeedPot,
    Mark,
    Announce,
    Close,
}

impl From<SessionAction> for VisibleAction {
    fn from(value: SessionAction) -> Self {
        match value {
            SessionAction::Create => VisibleAction::Create,
            SessionAction::Start => VisibleAction::Start,
            SessionAction::Roll => VisibleAction::Roll,
            SessionAction::AdvanceStage => VisibleAction::Advance,
            SessionAction::ResolveClaim => VisibleAction::ResolveClaim,
            SessionAction::Buy => VisibleAction::Buy,
            SessionAction::SeedPot => VisibleAction::SeedPot,
            SessionAction::Mark => VisibleAction::Mark,
            SessionAction::Announce => VisibleAction::Announce,
            SessionAction::Close => VisibleAction::Close,
        }
    }
}

/// Claim status exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleClaimStatus {
    Pending,
    Approved,
    Denied,
    /// Only used for owners who never claimed.
    None,
}

impl From<ClaimState> for VisibleClaimStatus {
    fn from(value: ClaimState) -> Self {
        match value {
            ClaimState::Pending => VisibleClaimStatus::Pending,
            ClaimState::Approved => VisibleClaimStatus::Approved,
            ClaimState::Denied => VisibleClaimStatus::Denied,
        }
    }
}

impl From<OwnerClaimStatus> for VisibleClaimStatus {
    fn from(value: OwnerClaimStatus) -> Self {
        match value {
            OwnerClaimStatus::Pending => VisibleClaimStatus::Pending,
            OwnerClaimStatus::Approved => VisibleClaimStatus::Approved,
            OwnerClaimStatus::Denied => VisibleClaimStatus::Denied,
            OwnerClaimStatus::NoClaim => VisibleClaimStatus::None,
        }
    }
}
