//! Human-in-the-loop claim resolution.
//!
//! Approving a claim always advances the stage in the same operation so the poller never
//! observes an approved claim on a stage that is still open for it. Both paths finish with a
//! forced refresh, whatever the outcome.

use tracing::info;

use crate::{
    dto::claims::{ClaimOutcome, ClaimResolutionResponse},
    error::ServiceError,
    services::{
        console_events::{broadcast_claim_resolved, record_action, report},
        session_service::{ensure_allowed, refresh_after_action, snapshot},
    },
    state::{SharedState, lifecycle::SessionAction},
};

/// Approve the pending claim on `card_id`, then advance the stage.
pub async fn approve(
    state: &SharedState,
    card_id: &str,
) -> Result<ClaimResolutionResponse, ServiceError> {
    report(state, resolve(state, card_id, Resolution::Approve).await)
}

/// Deny the pending claim on `card_id`; the stage stays open.
pub async fn deny(
    state: &SharedState,
    card_id: &str,
) -> Result<ClaimResolutionResponse, ServiceError> {
    report(state, resolve(state, card_id, Resolution::Deny).await)
}

#[derive(Debug, Clone, Copy)]
enum Resolution {
    Approve,
    Deny,
}

async fn resolve(
    state: &SharedState,
    card_id: &str,
    resolution: Resolution,
) -> Result<ClaimResolutionResponse, ServiceError> {
    let game_id = ensure_allowed(state, SessionAction::ResolveClaim).await?;
    let pending = state
        .store()
        .read_session(|session| {
            session.is_some_and(|game| {
                game.claims
                    .iter()
                    .any(|claim| claim.card_id == card_id && claim.pending)
            })
        })
        .await;
    if !pending {
        return Err(ServiceError::InvalidState(format!(
            "No pending claim for card {card_id}."
        )));
    }

    let Some(_guard) = state.claim_locks().acquire(&game_id, card_id) else {
        return Err(ServiceError::InvalidState(
            "This claim is already being resolved.".into(),
        ));
    };

    let result = match resolution {
        Resolution::Approve => approve_and_advance(state, &game_id, card_id).await,
        Resolution::Deny => state
            .transport()
            .deny_claim(&game_id, card_id)
            .await
            .map(|()| ClaimOutcome::Denied)
            .map_err(ServiceError::from),
    };
    refresh_after_action(state, &game_id).await;
    let outcome = result?;

    info!(game_id = %game_id, card_id = %card_id, outcome = ?outcome, "claim resolved");
    record_action(state, outcome.message()).await;
    broadcast_claim_resolved(state, &game_id, card_id, outcome);

    Ok(ClaimResolutionResponse {
        card_id: card_id.to_string(),
        outcome,
        message: outcome.message().to_string(),
        snapshot: snapshot(state).await,
    })
}

async fn approve_and_advance(
    state: &SharedState,
    game_id: &str,
    card_id: &str,
) -> Result<ClaimOutcome, ServiceError> {
    let transport = state.transport();
    transport.approve_claim(game_id, card_id).await?;
    let advanced = transport.advance_stage(game_id).await?;
    Ok(if advanced.ended {
        ClaimOutcome::GameEnded
    } else {
        ClaimOutcome::StageAdvanced
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dto::phase::VisibleSessionPhase,
        services::test_support::selected_state,
        state::game::{
            GameSession,
            fixtures::{claim, session},
        },
        transport::fake::{Call, Failure},
    };

    fn claimed(stage: &str) -> GameSession {
        let mut game = session("g1");
        game.started = true;
        game.called = vec![4, 8, 15];
        game.stage = stage.into();
        game.claims = vec![claim("Amy", "c1", true, false)];
        game
    }

    fn resolution_calls(calls: Vec<Call>) -> Vec<Call> {
        calls
            .into_iter()
            .filter(|call| {
                matches!(call, Call::Approve(_) | Call::Deny(_) | Call::Advance(_))
            })
            .collect()
    }

    #[tokio::test]
    async fn approval_advances_the_stage_then_refreshes() {
        let (state, fake) = selected_state(claimed("single")).await;

        let response = approve(&state, "c1").await.unwrap();
        assert_eq!(response.outcome, ClaimOutcome::StageAdvanced);
        assert_eq!(
            resolution_calls(fake.calls()),
            vec![Call::Approve("c1".into()), Call::Advance("g1".into())]
        );
        assert_eq!(fake.count(|call| matches!(call, Call::FetchSession(_))), 2);

        let summary = response.snapshot.session.unwrap();
        assert_eq!(summary.stage, "double");
        assert_eq!(response.snapshot.phase, VisibleSessionPhase::Running);
    }

    #[tokio::test]
    async fn approving_the_last_stage_reports_game_ended() {
        let (state, _fake) = selected_state(claimed("full")).await;

        let response = approve(&state, "c1").await.unwrap();
        assert_eq!(response.outcome, ClaimOutcome::GameEnded);
        assert_eq!(response.snapshot.phase, VisibleSessionPhase::Finished);
    }

    #[tokio::test]
    async fn denial_keeps_the_stage() {
        let (state, fake) = selected_state(claimed("single")).await;

        let response = deny(&state, "c1").await.unwrap();
        assert_eq!(response.outcome, ClaimOutcome::Denied);
        assert_eq!(resolution_calls(fake.calls()), vec![Call::Deny("c1".into())]);
        assert_eq!(response.snapshot.session.unwrap().stage, "single");
    }

    #[tokio::test]
    async fn failed_advance_still_refreshes() {
        let (state, fake) = selected_state(claimed("single")).await;
        fake.fail_when(
            |call| matches!(call, Call::Advance(_)),
            Failure::Rejected("Stage locked".into()),
        );

        let err = approve(&state, "c1").await.unwrap_err();
        assert_eq!(err.to_string(), "Stage locked");
        assert_eq!(fake.count(|call| matches!(call, Call::FetchSession(_))), 2);
        assert!(!state.claim_locks().is_in_flight("g1", "c1"));
    }

    #[tokio::test]
    async fn claim_in_flight_rejects_a_second_submission() {
        let (state, fake) = selected_state(claimed("single")).await;
        let gate = fake.gate_approvals();

        let first = tokio::spawn({
            let state = state.clone();
            async move { approve(&state, "c1").await }
        });
        while fake.count(|call| matches!(call, Call::Approve(_))) == 0 {
            tokio::task::yield_now().await;
        }

        let err = approve(&state, "c1").await.unwrap_err();
        assert_eq!(err.to_string(), "This claim is already being resolved.");
        assert_eq!(fake.count(|call| matches!(call, Call::Approve(_))), 1);

        gate.notify_one();
        let response = first.await.unwrap().unwrap();
        assert_eq!(response.outcome, ClaimOutcome::StageAdvanced);
        assert!(!state.claim_locks().is_in_flight("g1", "c1"));
    }

    #[tokio::test]
    async fn resolving_without_a_pending_claim_is_rejected() {
        let (state, fake) = selected_state(claimed("single")).await;

        let err = approve(&state, "other").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert!(resolution_calls(fake.calls()).is_empty());
    }
}
