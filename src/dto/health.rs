use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status (`ok`).
    pub status: String,
    /// Whether a minigame instance is currently live.
    pub game_running: bool,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(game_running: bool) -> Self {
        Self {
            status: "ok".to_string(),
            game_running,
        }
    }
}
