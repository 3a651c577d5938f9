//! Session lifecycle derived from the store's snapshot.
//!
//! Phases are never tracked on their own: every decision is recomputed from the latest
//! [`GameSession`], so the console cannot disagree with the game service for longer than one
//! refresh.

use thiserror::Error;

use crate::state::game::GameSession;

/// Phase of the viewed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No game is selected.
    NoSession,
    /// The game exists but the draw has not started.
    WaitingToStart,
    /// Numbers are being drawn and no claim is pending.
    Running,
    /// At least one claim awaits the operator.
    StageComplete,
    /// The game is closed; only reads remain valid.
    Finished,
}

impl SessionPhase {
    /// Derive the phase from a snapshot.
    pub fn of(session: Option<&GameSession>) -> Self {
        match session {
            None => SessionPhase::NoSession,
            Some(game) if game.game_id.is_empty() => SessionPhase::NoSession,
            Some(game) if !game.active => SessionPhase::Finished,
            Some(game) if !game.started => SessionPhase::WaitingToStart,
            Some(game) if game.has_pending_claim() => SessionPhase::StageComplete,
            Some(_) => SessionPhase::Running,
        }
    }

    /// The action a UI should emphasise in this phase.
    pub fn primary_action(self) -> Option<SessionAction> {
        match self {
            SessionPhase::WaitingToStart => Some(SessionAction::Start),
            SessionPhase::Running => Some(SessionAction::Roll),
            SessionPhase::StageComplete => Some(SessionAction::AdvanceStage),
            SessionPhase::NoSession | SessionPhase::Finished => None,
        }
    }
}

/// Operator actions gated by the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionAction {
    /// Create a new game.
    Create,
    /// Begin the draw.
    Start,
    /// Draw the next number.
    Roll,
    /// Advance to the next stage.
    AdvanceStage,
    /// Approve or deny a claim.
    ResolveClaim,
    /// Sell or gift cards.
    Buy,
    /// Add funds to the pot.
    SeedPot,
    /// Mark a number on a card.
    Mark,
    /// Toggle service-side call announcements.
    Announce,
    /// Close the game for good.
    Close,
}

impl SessionAction {
    /// Every gated action, in display order.
    pub const ALL: [SessionAction; 10] = [
        SessionAction::Create,
        SessionAction::Start,
        SessionAction::Roll,
        SessionAction::AdvanceStage,
        SessionAction::ResolveClaim,
        SessionAction::Buy,
        SessionAction::SeedPot,
        SessionAction::Mark,
        SessionAction::Announce,
        SessionAction::Close,
    ];
}

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The action is not legal in the current phase.
    WrongPhase,
    /// Ticket sales closed when the first number was called.
    SalesClosed,
}

/// Error returned when an action is not permitted by the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.action, .phase, .reason))]
pub struct ActionRejected {
    /// Action the operator attempted.
    pub action: SessionAction,
    /// Phase the session was in.
    pub phase: SessionPhase,
    /// Why the action was refused.
    pub reason: RejectReason,
}

fn describe(action: &SessionAction, phase: &SessionPhase, reason: &RejectReason) -> String {
    let (action, phase) = (*action, *phase);
    match (*reason, phase) {
        (RejectReason::SalesClosed, _) => "Ticket sales are closed once numbers are called.".into(),
        (_, SessionPhase::NoSession) => "Select a game first.".into(),
        (_, SessionPhase::Finished) => "This game has ended.".into(),
        (_, SessionPhase::WaitingToStart) if action == SessionAction::Roll => {
            "Start the game before rolling.".into()
        }
        (_, SessionPhase::StageComplete) if action == SessionAction::Roll => {
            "Resolve the pending claim before rolling.".into()
        }
        (_, SessionPhase::Running) if action == SessionAction::AdvanceStage => {
            "No claim is waiting to advance the stage.".into()
        }
        (_, SessionPhase::Running) if action == SessionAction::ResolveClaim => {
            "No claim is pending.".into()
        }
        _ => format!("{action:?} is not available while the game is {phase:?}."),
    }
}

/// Check `action` against the snapshot and return the phase it was checked in.
pub fn ensure_permitted(
    session: Option<&GameSession>,
    action: SessionAction,
) -> Result<SessionPhase, ActionRejected> {
    use SessionAction as A;
    use SessionPhase as P;

    let phase = SessionPhase::of(session);
    let allowed = match (action, phase) {
        (A::Create, P::NoSession) => true,
        (A::Start, P::WaitingToStart) => true,
        (A::Roll, P::Running) => true,
        (A::AdvanceStage | A::ResolveClaim, P::StageComplete) => true,
        (A::Buy | A::SeedPot, P::WaitingToStart | P::Running) => true,
        (A::Mark, P::Running | P::StageComplete) => true,
        (A::Announce | A::Close, P::WaitingToStart | P::Running | P::StageComplete) => true,
        _ => false,
    };

    if !allowed {
        return Err(ActionRejected {
            action,
            phase,
            reason: RejectReason::WrongPhase,
        });
    }

    let sales_closed = session.is_some_and(|game| !game.called.is_empty());
    if action == A::Buy && sales_closed {
        return Err(ActionRejected {
            action,
            phase,
            reason: RejectReason::SalesClosed,
        });
    }

    Ok(phase)
}

/// Convenience wrapper for availability flags.
pub fn is_permitted(session: Option<&GameSession>, action: SessionAction) -> bool {
    ensure_permitted(session, action).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::fixtures::{claim, session};

    fn waiting() -> GameSession {
        session("g1")
    }

    fn running() -> GameSession {
        let mut game = session("g1");
        game.started = true;
        game
    }

    #[test]
    fn phases_follow_snapshot() {
        assert_eq!(SessionPhase::of(None), SessionPhase::NoSession);
        assert_eq!(SessionPhase::of(Some(&waiting())), SessionPhase::WaitingToStart);
        assert_eq!(SessionPhase::of(Some(&running())), SessionPhase::Running);

        let mut claimed = running();
        claimed.claims.push(claim("A", "c1", true, false));
        assert_eq!(SessionPhase::of(Some(&claimed)), SessionPhase::StageComplete);

        claimed.claims[0].pending = false;
        assert_eq!(SessionPhase::of(Some(&claimed)), SessionPhase::Running);

        claimed.active = false;
        assert_eq!(SessionPhase::of(Some(&claimed)), SessionPhase::Finished);
    }

    #[test]
    fn roll_rejected_before_start() {
        let err = ensure_permitted(Some(&waiting()), SessionAction::Roll).unwrap_err();
        assert_eq!(err.phase, SessionPhase::WaitingToStart);
        assert_eq!(err.to_string(), "Start the game before rolling.");
        assert!(is_permitted(Some(&running()), SessionAction::Roll));
    }

    #[test]
    fn buy_rejected_once_numbers_called() {
        let mut game = running();
        assert!(is_permitted(Some(&game), SessionAction::Buy));

        game.called.push(17);
        let err = ensure_permitted(Some(&game), SessionAction::Buy).unwrap_err();
        assert_eq!(err.reason, RejectReason::SalesClosed);
        assert!(is_permitted(Some(&game), SessionAction::SeedPot));
    }

    #[test]
    fn finished_session_rejects_every_mutation() {
        let mut game = running();
        game.active = false;
        for action in SessionAction::ALL {
            assert!(
                !is_permitted(Some(&game), action),
                "{action:?} should be rejected"
            );
        }
    }

    #[test]
    fn create_only_without_session() {
        assert!(is_permitted(None, SessionAction::Create));
        assert!(!is_permitted(Some(&waiting()), SessionAction::Create));
        assert!(!is_permitted(None, SessionAction::Close));
    }

    #[test]
    fn primary_action_per_phase() {
        assert_eq!(
            SessionPhase::WaitingToStart.primary_action(),
            Some(SessionAction::Start)
        );
        assert_eq!(SessionPhase::Running.primary_action(), Some(SessionAction::Roll));
        assert_eq!(
            SessionPhase::StageComplete.primary_action(),
            Some(SessionAction::AdvanceStage)
        );
        assert_eq!(SessionPhase::Finished.primary_action(), None);
    }
}
