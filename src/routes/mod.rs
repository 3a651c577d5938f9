use axum::Router;

use crate::state::SharedState;

pub mod console;
pub mod docs;
pub mod health;
pub mod owners;
pub mod sse;

/// Compose all route trees and attach the shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(sse::router())
        .merge(console::router())
        .merge(owners::router())
        .merge(docs::router())
        .with_state(state)
}
