//! Bingo operator console daemon: polls the game service and exposes operator actions over a
//! local REST API and an SSE stream.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bingo_console::{
    config::ConsoleConfig,
    routes,
    services::{polling, session_service},
    state::{AppState, SharedState},
    transport::http::{HttpTransport, HttpTransportConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ConsoleConfig::load();
    let transport = HttpTransport::new(HttpTransportConfig::from(&config))
        .context("building game service client")?;
    info!(base_url = %config.base_url, "using game service");

    let port = config.port;
    let restored = config.last_selected_game_id.clone();
    let app_state = AppState::new(config, Arc::new(transport));

    if let Some(game_id) = restored {
        if let Err(err) = session_service::select_game(&app_state, Some(game_id.clone())).await {
            warn!(game_id = %game_id, error = %err, "could not restore the last selected game");
        }
    }
    polling::ensure_polling(&app_state).await;

    let app = build_router(app_state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(%addr, "starting console");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    polling::stop_polling(&app_state).await;
    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable, waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
