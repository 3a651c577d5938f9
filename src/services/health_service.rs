use tracing::warn;

use crate::{dto::health::HealthResponse, services::polling, state::SharedState};

/// Report whether the console is in sync with the game service.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let degraded = state.is_degraded();
    if degraded {
        warn!("last refresh failed (degraded mode)");
    }

    HealthResponse::new(
        degraded,
        polling::is_polling(state).await,
        state.store().selected().await,
    )
}
