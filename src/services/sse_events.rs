use tracing::warn;

use crate::{
    dto::{
        game::GameSummary,
        sse::{GameClosedEvent, GameLaunchedEvent, ServerEvent},
    },
    state::SharedState,
};

/// Broadcast that the host mounted a new minigame instance.
pub fn broadcast_game_launched(state: &SharedState, summary: &GameSummary) {
    let payload = GameLaunchedEvent {
        id: summary.id,
        game: summary.game.clone(),
        launched_at: summary.launched_at.clone(),
    };
    broadcast(state, "game_launched", &payload);
}

/// Broadcast that the live instance went away and the menu is back.
pub fn broadcast_game_closed(state: &SharedState, reason: &str) {
    let payload = GameClosedEvent {
        reason: reason.to_string(),
    };
    broadcast(state, "game_closed", &payload);
}

fn broadcast<T: serde::Serialize>(state: &SharedState, event: &str, payload: &T) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(server_event) => state.events().broadcast(server_event),
        Err(err) => warn!(event, error = %err, "failed to serialize host event"),
    }
}
