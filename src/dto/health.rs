use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the last refresh of the selected game failed.
    pub status: String,
    /// Whether the refresh timer is running.
    pub polling: bool,
    /// Game the console is following.
    pub selected_game_id: Option<String>,
}

impl HealthResponse {
    /// Build the response from the console's current flags.
    pub fn new(degraded: bool, polling: bool, selected_game_id: Option<String>) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_string(),
            polling,
            selected_game_id,
        }
    }
}
