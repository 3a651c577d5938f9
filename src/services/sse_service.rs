use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::{
        session::ConsoleSnapshot,
        sse::{Handshake, ServerEvent},
    },
    state::SharedState,
};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

/// Subscribe to the console event stream.
pub fn subscribe(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.events().subscribe()
}

/// Events a new subscriber receives before anything broadcast: a handshake, then the
/// current snapshot so the UI can render without waiting for the next refresh.
pub async fn initial_events(state: &SharedState) -> Vec<ServerEvent> {
    let handshake = Handshake {
        message: "console stream connected".into(),
        degraded: state.is_degraded(),
    };
    let snapshot = ConsoleSnapshot::from(state.store().snapshot().await);

    let mut events = Vec::with_capacity(2);
    match ServerEvent::json(Some("handshake".to_string()), &handshake) {
        Ok(event) => events.push(event),
        Err(err) => warn!(error = %err, "failed to serialize SSE handshake"),
    }
    match ServerEvent::json(Some("session.snapshot".to_string()), &snapshot) {
        Ok(event) => events.push(event),
        Err(err) => warn!(error = %err, "failed to serialize initial snapshot"),
    }
    events
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

/// Convert a broadcast receiver into an SSE response.
///
/// `initial` is sent first. A forwarder task moves broadcast events into a small bounded
/// channel and stops once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    initial: Vec<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        for payload in initial {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // the next snapshot supersedes whatever was skipped
                            debug!(skipped, "console SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("Console SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("keep-alive"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{services::test_support::selected_state, state::game::fixtures::session};

    #[tokio::test]
    async fn new_subscribers_get_handshake_then_snapshot() {
        let (state, _fake) = selected_state(session("g1")).await;

        let events = initial_events(&state).await;
        let names: Vec<_> = events.iter().filter_map(|e| e.event.as_deref()).collect();
        assert_eq!(names, vec!["handshake", "session.snapshot"]);
        assert!(events[1].data.contains("\"selected_game_id\":\"g1\""));
    }
}
