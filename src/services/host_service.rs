use std::time::SystemTime;

use tokio::sync::oneshot;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        game::{GameDescriptor, GameSummary, HostSnapshot},
        phase::VisibleHostPhase,
    },
    error::ServiceError,
    games::{self, GameKind, harness::{CompletionHandle, GameHarness}},
    services::sse_events,
    state::{ActiveGame, SharedState},
};

/// The menu catalog, in presentation order.
pub fn list_games() -> Vec<GameDescriptor> {
    games::catalog()
        .iter()
        .map(|(kind, meta)| GameDescriptor::new(kind.slug(), meta))
        .collect()
}

/// Mount and start the variant identified by `slug`.
///
/// Any previously live instance is torn down first; the new instance gets a
/// fresh completion channel whose firing returns the host to the menu.
pub async fn launch(state: &SharedState, slug: &str) -> Result<GameSummary, ServiceError> {
    let kind: GameKind = slug.parse()?;

    let mut slot = state.live().write().await;
    if let Some(previous) = slot.take() {
        info!(game = %previous.kind, id = %previous.id, "replacing live game");
        previous.instance.cleanup();
        sse_events::broadcast_game_closed(state, "replaced");
    }

    let (completion_tx, completion_rx) = oneshot::channel();
    let harness = GameHarness::new(
        state.zones().clone(),
        state.cues().clone(),
        CompletionHandle::new(completion_tx),
    );
    let instance = games::build(kind, state.config().tunings(), harness);
    instance.init();

    let game = ActiveGame {
        id: Uuid::new_v4(),
        kind,
        instance,
        launched_at: SystemTime::now(),
    };
    let summary = GameSummary::from(&game);

    // The watcher owns the "return to menu" side of the module contract. If
    // the instance is torn down first its sender is dropped and the watcher
    // simply exits.
    let watcher_state = state.clone();
    let launch_id = game.id;
    tokio::spawn(async move {
        if completion_rx.await.is_ok() {
            finish(&watcher_state, launch_id).await;
        }
    });

    *slot = Some(game);
    drop(slot);

    info!(game = %kind, id = %summary.id, "minigame launched");
    sse_events::broadcast_game_launched(state, &summary);
    Ok(summary)
}

/// Tear down the live instance on player request and return to the menu.
pub async fn quit(state: &SharedState) -> Result<(), ServiceError> {
    let mut slot = state.live().write().await;
    let Some(game) = slot.take() else {
        return Err(ServiceError::InvalidState("no game is running".into()));
    };
    drop(slot);

    game.instance.cleanup();
    info!(game = %game.kind, id = %game.id, "minigame quit");
    sse_events::broadcast_game_closed(state, "quit");
    Ok(())
}

/// Current host state for REST consumers.
pub async fn snapshot(state: &SharedState) -> HostSnapshot {
    let guard = state.live().read().await;
    match guard.as_ref() {
        Some(game) => HostSnapshot {
            phase: VisibleHostPhase::Playing,
            game: Some(GameSummary::from(game)),
        },
        None => HostSnapshot {
            phase: VisibleHostPhase::Menu,
            game: None,
        },
    }
}

/// Completion-side teardown: runs when an instance signals it is done.
async fn finish(state: &SharedState, launch_id: Uuid) {
    let mut slot = state.live().write().await;
    let still_current = slot.as_ref().is_some_and(|game| game.id == launch_id);
    if !still_current {
        // A newer launch already took the slot; nothing to do.
        return;
    }
    let Some(game) = slot.take() else {
        return;
    };
    drop(slot);

    game.instance.cleanup();
    info!(game = %game.kind, id = %game.id, "minigame completed; returning to menu");
    sse_events::broadcast_game_closed(state, "completed");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::{config::AppConfig, games::{PlayerInput, PlayerSlot}, state::AppState};

    #[test]
    fn catalog_has_four_entries_with_stable_ids() {
        let games = list_games();
        let ids: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["quickdraw", "stroop", "arithmetic", "rhythm"]);
    }

    #[tokio::test(start_paused = true)]
    async fn launch_mounts_a_single_live_instance() {
        let state = AppState::new(AppConfig::default());

        let summary = launch(&state, "quickdraw").await.expect("launch");
        assert_eq!(summary.game, "quickdraw");
        assert_eq!(summary.scores, [0, 0]);
        assert!(state.live().read().await.is_some());

        let snap = snapshot(&state).await;
        assert_eq!(snap.phase, VisibleHostPhase::Playing);
        assert_eq!(snap.game.expect("live game").game, "quickdraw");
    }

    #[tokio::test(start_paused = true)]
    async fn launching_an_unknown_game_leaves_the_menu_untouched() {
        let state = AppState::new(AppConfig::default());

        let err = launch(&state, "pinball").await.expect_err("unknown game");
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(state.live().read().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn relaunching_replaces_the_previous_instance() {
        let state = AppState::new(AppConfig::default());

        let first = launch(&state, "quickdraw").await.expect("first launch");
        let second = launch(&state, "rhythm").await.expect("second launch");
        assert_ne!(first.id, second.id);

        let guard = state.live().read().await;
        let game = guard.as_ref().expect("live game");
        assert_eq!(game.kind, GameKind::Rhythm);
    }

    #[tokio::test(start_paused = true)]
    async fn quit_clears_the_slot_and_rejects_a_second_call() {
        let state = AppState::new(AppConfig::default());

        launch(&state, "stroop").await.expect("launch");
        quit(&state).await.expect("quit");
        assert!(state.live().read().await.is_none());

        let err = quit(&state).await.expect_err("nothing to quit");
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let snap = snapshot(&state).await;
        assert_eq!(snap.phase, VisibleHostPhase::Menu);
        assert!(snap.game.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn completion_returns_the_host_to_the_menu() {
        let state = AppState::new(AppConfig::default());

        launch(&state, "rhythm").await.expect("launch");
        let instance = state.live_instance().await.expect("live instance");

        // Race to the goal: the first tap starts the race, the rest land
        // dead-center on the paused clock.
        instance.handle_input(PlayerSlot::One, PlayerInput::Tap);
        for _ in 0..20 {
            instance.handle_input(PlayerSlot::One, PlayerInput::Tap);
        }
        assert_eq!(instance.phase_label(), "ended");

        // Completion fires after the terminal display delay, then the
        // watcher empties the slot.
        sleep(Duration::from_millis(3200)).await;
        tokio::task::yield_now().await;
        sleep(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;
        assert!(state.live().read().await.is_none());
    }
}
