/// Claim approval and denial.
pub mod claim_service;
/// Broadcast helpers for the console event stream.
pub mod console_events;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Card inspection and marking.
pub mod marking_service;
/// Owner roster, tokens and cards.
pub mod owner_service;
/// Periodic refresh of the selected game.
pub mod polling;
/// Game selection, refresh and lifecycle actions.
pub mod session_service;
/// Server-Sent Events streaming.
pub mod sse_service;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::{
        config::ConsoleConfig,
        services::session_service,
        state::{AppState, SharedState, game::GameSession},
        transport::fake::FakeTransport,
    };

    /// Fresh state backed by an empty fake service.
    pub fn test_state() -> (SharedState, FakeTransport) {
        let fake = FakeTransport::new();
        let state = AppState::new(ConsoleConfig::default(), Arc::new(fake.clone()));
        (state, fake)
    }

    /// State with `session` known to the fake and already selected.
    pub async fn selected_state(session: GameSession) -> (SharedState, FakeTransport) {
        let (state, fake) = test_state();
        let game_id = session.game_id.clone();
        fake.insert_session(session);
        session_service::select_game(&state, Some(game_id))
            .await
            .unwrap();
        (state, fake)
    }
}
