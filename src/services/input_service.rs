use tracing::{debug, info};

use crate::{
    error::ServiceError,
    games::{PlayerInput, PlayerSlot},
    state::SharedState,
};

/// Route one slot-tagged input event into the live minigame instance.
///
/// The instance serializes its own handlers; this function only resolves the
/// single live slot and hands the event over.
pub async fn dispatch(
    state: &SharedState,
    slot: PlayerSlot,
    input: PlayerInput,
) -> Result<(), ServiceError> {
    let Some(instance) = state.live_instance().await else {
        debug!(%slot, "input dropped: no game is running");
        return Err(ServiceError::InvalidState("no game is running".into()));
    };
    instance.handle_input(slot, input);
    Ok(())
}

/// Unlock the shared cue playback capability. Idempotent; browsers gate audio
/// behind a first user gesture, so frontends call this on their first tap.
pub fn enable_audio(state: &SharedState) {
    if !state.cues().is_enabled() {
        info!("audio cues enabled");
    }
    state.cues().enable();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, services::host_service, state::AppState};

    #[tokio::test(start_paused = true)]
    async fn dispatch_without_a_live_game_is_rejected() {
        let state = AppState::new(AppConfig::default());
        let err = dispatch(&state, PlayerSlot::One, PlayerInput::Tap)
            .await
            .expect_err("no game running");
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_reaches_the_live_instance() {
        let state = AppState::new(AppConfig::default());
        host_service::launch(&state, "quickdraw").await.expect("launch");

        dispatch(&state, PlayerSlot::One, PlayerInput::Tap)
            .await
            .expect("dispatch tap");
        let instance = state.live_instance().await.expect("live instance");
        assert_eq!(instance.phase_label(), "ready");
    }

    #[tokio::test(start_paused = true)]
    async fn enable_audio_is_idempotent() {
        let state = AppState::new(AppConfig::default());
        assert!(!state.cues().is_enabled());
        enable_audio(&state);
        enable_audio(&state);
        assert!(state.cues().is_enabled());
    }
}
