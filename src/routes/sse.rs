use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/console",
    tag = "sse",
    responses((status = 200, description = "Console SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream snapshots, history and status events to the operator UI.
pub async fn console_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = sse_service::subscribe(&state);
    info!("New console SSE connection");
    let initial = sse_service::initial_events(&state).await;
    sse_service::to_sse_stream(receiver, initial)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/console", get(console_stream))
}
