use tracing::{info, warn};
use validator::Validate;

use crate::{
    dto::{
        card::{CardView, CellPosition, FailedCell, InspectCardRequest, MarkResponse},
        sse::StatusKind,
    },
    error::ServiceError,
    services::{
        console_events::{broadcast_card, broadcast_status, record_action, report},
        session_service::{ensure_allowed, require_selection},
    },
    state::{InspectedCard, SharedState, game::normalize_header, lifecycle::SessionAction},
};

/// Load one of an owner's cards for inspection and marking.
pub async fn inspect_card(
    state: &SharedState,
    request: InspectCardRequest,
) -> Result<CardView, ServiceError> {
    report(state, inspect(state, request).await)
}

async fn inspect(state: &SharedState, request: InspectCardRequest) -> Result<CardView, ServiceError> {
    request.validate()?;
    let game_id = require_selection(state).await?;
    let owner_name = request.owner_name.trim().to_string();

    let cards = state
        .transport()
        .owner_cards(&game_id, &owner_name)
        .await?;
    let Some(card) = cards.into_iter().find(|card| card.card_id == request.card_id) else {
        return Err(ServiceError::NotFound(format!(
            "Card {} not found for {owner_name}.",
            request.card_id
        )));
    };

    let inspected = InspectedCard {
        game_id,
        owner_name,
        card,
    };
    let view = render(state, &inspected).await;
    *state.inspected().write().await = Some(inspected);
    broadcast_card(state, &view);
    Ok(view)
}

/// View of the inspected card against the current snapshot.
pub async fn inspected_card(state: &SharedState) -> Option<CardView> {
    let inspected = state.inspected().read().await.clone()?;
    Some(render(state, &inspected).await)
}

async fn render(state: &SharedState, inspected: &InspectedCard) -> CardView {
    state
        .store()
        .read_session(|session| match session {
            Some(game) if game.game_id == inspected.game_id => {
                CardView::inspected(inspected, &game.header_text, &game.called)
            }
            _ => CardView::inspected(inspected, &normalize_header(None), &[]),
        })
        .await
}

/// Mark every cell of the inspected card holding `number`.
///
/// One request is sent per matching cell. Each success is applied to the local copy right
/// away and a failed cell never stops the remaining ones.
pub async fn mark_number(state: &SharedState, number: u32) -> Result<MarkResponse, ServiceError> {
    report(state, mark(state, number).await)
}

async fn mark(state: &SharedState, number: u32) -> Result<MarkResponse, ServiceError> {
    let game_id = ensure_allowed(state, SessionAction::Mark).await?;
    let (card_id, cells) = {
        let inspected = state.inspected().read().await;
        let Some(current) = inspected.as_ref().filter(|current| current.game_id == game_id) else {
            return Err(ServiceError::InvalidState("Inspect a card first.".into()));
        };
        (current.card.card_id.clone(), current.card.cells_with(number))
    };

    if cells.is_empty() {
        return Err(ServiceError::NotOnCard(number));
    }

    let transport = state.transport();
    let mut marked = Vec::with_capacity(cells.len());
    let mut failed = Vec::new();
    let mut first_error = None;

    for cell in cells {
        match transport.mark(&game_id, &card_id, cell.row, cell.col).await {
            Ok(()) => {
                let mut inspected = state.inspected().write().await;
                if let Some(current) = inspected
                    .as_mut()
                    .filter(|current| current.game_id == game_id && current.card.card_id == card_id)
                {
                    current.card.set_marked(cell);
                }
                marked.push(CellPosition::from(cell));
            }
            Err(err) => {
                let err = ServiceError::from(err);
                warn!(
                    game_id = %game_id,
                    card_id = %card_id,
                    row = cell.row,
                    col = cell.col,
                    error = %err,
                    "mark request failed"
                );
                failed.push(FailedCell {
                    row: cell.row,
                    col: cell.col,
                    error: err.to_string(),
                });
                first_error.get_or_insert(err);
            }
        }
    }

    if marked.is_empty() {
        if let Some(err) = first_error {
            return Err(err);
        }
    }

    let view = inspected_card(state)
        .await
        .ok_or_else(|| ServiceError::InvalidState("Inspect a card first.".into()))?;
    broadcast_card(state, &view);

    if failed.is_empty() {
        info!(game_id = %game_id, card_id = %card_id, number, cells = marked.len(), "number marked");
        record_action(state, &format!("Marked {number} on {card_id}.")).await;
    } else {
        let reason = failed
            .first()
            .map(|cell| cell.error.as_str())
            .unwrap_or_default();
        let message = format!(
            "Marked {} of {} cells for {number}: {reason}",
            marked.len(),
            marked.len() + failed.len()
        );
        broadcast_status(state, StatusKind::Err, &message);
    }

    Ok(MarkResponse {
        number,
        marked,
        failed,
        card: view,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::test_support::selected_state,
        state::game::{Card, fixtures::session},
        transport::fake::{Call, Failure, FakeTransport},
    };

    async fn inspecting(card: Card) -> (SharedState, FakeTransport) {
        let mut game = session("g1");
        game.started = true;
        let (state, fake) = selected_state(game).await;
        let card_id = card.card_id.clone();
        fake.set_cards("g1", "Amy", vec![card]);
        inspect_card(
            &state,
            InspectCardRequest {
                owner_name: "Amy".into(),
                card_id,
            },
        )
        .await
        .unwrap();
        (state, fake)
    }

    fn repeated_card() -> Card {
        Card::new("c1".into(), vec![vec![1, 2], vec![3, 1]], Vec::new())
    }

    fn mark_calls(fake: &FakeTransport) -> usize {
        fake.count(|call| matches!(call, Call::Mark { .. }))
    }

    async fn local_marks(state: &SharedState) -> Vec<Vec<bool>> {
        state
            .inspected()
            .read()
            .await
            .as_ref()
            .map(|current| current.card.marks.clone())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn every_matching_cell_is_marked() {
        let (state, fake) = inspecting(repeated_card()).await;

        let response = mark_number(&state, 1).await.unwrap();
        assert_eq!(response.marked.len(), 2);
        assert!(response.failed.is_empty());
        assert_eq!(mark_calls(&fake), 2);
        assert_eq!(
            local_marks(&state).await,
            vec![vec![true, false], vec![false, true]]
        );
    }

    #[tokio::test]
    async fn number_not_on_card_sends_nothing() {
        let (state, fake) = inspecting(repeated_card()).await;

        let err = mark_number(&state, 9).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotOnCard(9)));
        assert_eq!(err.to_string(), "Number 9 is not on this card.");
        assert_eq!(mark_calls(&fake), 0);
    }

    #[tokio::test]
    async fn partial_failure_keeps_marking_the_rest() {
        let (state, fake) = inspecting(repeated_card()).await;
        fake.fail_when(
            |call| matches!(call, Call::Mark { row: 0, col: 0, .. }),
            Failure::Rejected("Cell locked".into()),
        );

        let response = mark_number(&state, 1).await.unwrap();
        assert_eq!(response.marked, vec![CellPosition { row: 1, col: 1 }]);
        assert_eq!(response.failed.len(), 1);
        assert_eq!(response.failed[0].error, "Cell locked");
        assert_eq!(mark_calls(&fake), 2);
        assert_eq!(
            local_marks(&state).await,
            vec![vec![false, false], vec![false, true]]
        );
    }

    #[tokio::test]
    async fn all_cells_failing_returns_the_first_error() {
        let (state, fake) = inspecting(repeated_card()).await;
        fake.fail_when(
            |call| matches!(call, Call::Mark { .. }),
            Failure::Rejected("Game not running".into()),
        );

        let err = mark_number(&state, 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Game not running");
        assert_eq!(mark_calls(&fake), 2);
    }

    #[tokio::test]
    async fn marking_requires_a_started_game() {
        let (state, fake) = selected_state(session("g1")).await;

        let err = mark_number(&state, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(mark_calls(&fake), 0);
    }

    #[tokio::test]
    async fn unknown_card_is_not_found() {
        let (state, fake) = selected_state(session("g1")).await;
        fake.set_cards("g1", "Amy", vec![repeated_card()]);

        let err = inspect_card(
            &state,
            InspectCardRequest {
                owner_name: "Amy".into(),
                card_id: "missing".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(state.inspected().read().await.is_none());
    }
}
