use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the process health and whether a game is currently live.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let game_running = state.live().read().await.is_some();
    HealthResponse::ok(game_running)
}
