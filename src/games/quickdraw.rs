//! Reaction duel: both players wait out a barrage of fakeout call-outs, then
//! race to tap first when the genuine draw signal lands.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use rand::Rng;
use tracing::debug;

use crate::games::{
    DelayRange, GameCore, GameKind, HasCore, Minigame, PlayerInput, PlayerSlot, after,
    harness::{Cue, GameHarness, GameUpdate},
};

/// Misleading call-outs barked during the wait to bait an early tap.
const FALSE_CUES: [&str; 7] = [
    "Ready...", "Steady...", "Banana!", "Cactus!", "Draw...", "Wait...", "Hold...",
];

/// The genuine draw signal.
const DRAW_CUE: &str = "BANG!";

/// Timing and scoring knobs for the reaction duel.
#[derive(Debug, Clone)]
pub struct QuickdrawTuning {
    /// Rounds played before the duel ends.
    pub rounds: u32,
    /// Random delay between round start and the genuine draw signal.
    pub draw_delay: DelayRange,
    /// Random delay before the first false cue of a round.
    pub first_false_cue: DelayRange,
    /// Random gap between consecutive false cues.
    pub false_cue_gap: DelayRange,
    /// Quiet window before the draw signal in which no false cue may land.
    pub false_cue_cutoff_ms: u64,
    /// Display time of a round's outcome before the next round opens.
    pub round_pause_ms: u64,
    /// Display time of the final result before completion fires.
    pub end_delay_ms: u64,
}

impl Default for QuickdrawTuning {
    fn default() -> Self {
        Self {
            rounds: 5,
            draw_delay: DelayRange::new(3000, 9000),
            first_false_cue: DelayRange::new(1000, 2000),
            false_cue_gap: DelayRange::new(1500, 3000),
            false_cue_cutoff_ms: 1000,
            round_pause_ms: 2000,
            end_delay_ms: 3000,
        }
    }
}

/// Where the duel currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DuelPhase {
    /// Between rounds; a tap from either slot arms the next round.
    Waiting,
    /// Round armed: false cues may fire, and tapping now is a foul.
    Ready,
    /// The draw signal is showing; the first tap takes the round.
    Draw,
    /// Round outcome on display; taps are ignored.
    RoundOver,
    /// All rounds played; terminal.
    Ended,
}

struct DuelState {
    phase: DuelPhase,
    scores: [u32; 2],
    round: u32,
}

/// Reaction duel instance. See the module docs for the flow.
pub struct QuickdrawDuel {
    me: Weak<QuickdrawDuel>,
    core: GameCore,
    tuning: QuickdrawTuning,
    state: Mutex<DuelState>,
}

impl QuickdrawDuel {
    /// Build an idle duel wired to `harness`.
    pub fn new(tuning: QuickdrawTuning, harness: GameHarness) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            core: GameCore::new(harness),
            tuning,
            state: Mutex::new(DuelState {
                phase: DuelPhase::Waiting,
                scores: [0, 0],
                round: 0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, DuelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn after_ms(&self, delay_ms: u64, action: impl FnOnce(&Self) + Send + 'static) {
        if let Some(me) = self.me.upgrade() {
            after(&me, Duration::from_millis(delay_ms), action);
        }
    }

    /// Show `text` on both zone message lines and in the center display.
    fn call_out(&self, text: &str) {
        self.core.harness.message_both(text);
        self.core.harness.update(GameUpdate::CenterCue {
            text: Some(text.to_string()),
        });
    }

    fn start_round(&self, state: &mut DuelState) {
        state.phase = DuelPhase::Ready;
        self.core.harness.update(GameUpdate::ZonesReset);
        self.call_out("WAIT...");

        let mut rng = rand::rng();
        let draw_delay = self.tuning.draw_delay.sample(&mut rng);

        // Fakeouts fill the wait but stay clear of the draw signal.
        let mut at = self.tuning.first_false_cue.sample(&mut rng);
        while at + self.tuning.false_cue_cutoff_ms < draw_delay {
            let text = FALSE_CUES[rng.random_range(0..FALSE_CUES.len())];
            self.after_ms(at, move |game| game.show_false_cue(text));
            at += self.tuning.false_cue_gap.sample(&mut rng);
        }

        self.after_ms(draw_delay, |game| game.show_draw_cue());
    }

    fn show_false_cue(&self, text: &str) {
        let state = self.lock();
        if state.phase != DuelPhase::Ready {
            return;
        }
        self.call_out(text);
        self.core.harness.cue(Cue::Tone);
    }

    fn show_draw_cue(&self) {
        let mut state = self.lock();
        if state.phase != DuelPhase::Ready {
            return;
        }
        state.phase = DuelPhase::Draw;
        self.call_out(DRAW_CUE);
        self.core.harness.cue(Cue::Impact);
    }

    /// A tap while the round is armed: point goes to the other slot.
    fn foul(&self, state: &mut DuelState, offender: PlayerSlot) {
        self.core.timers.cancel_all();
        self.core.harness.cue(Cue::Failure);
        self.resolve_round(state, format!("{offender} FOUL!"), offender.opponent());
    }

    /// A tap on the draw signal: point goes to the tapper.
    fn round_won(&self, state: &mut DuelState, winner: PlayerSlot) {
        self.core.timers.cancel_all();
        self.core.harness.cue(Cue::Success);
        self.resolve_round(state, format!("{winner} WINS!"), winner);
    }

    fn resolve_round(&self, state: &mut DuelState, text: String, winner: PlayerSlot) {
        state.phase = DuelPhase::RoundOver;
        state.scores[winner.index()] += 1;
        state.round += 1;

        self.core.harness.message_both(text);
        self.core
            .harness
            .update(GameUpdate::CenterCue { text: None });
        self.core.harness.update(GameUpdate::Scoreboard {
            scores: state.scores,
        });
        self.core
            .harness
            .update(GameUpdate::RoundOutcome { winner });

        self.after_ms(self.tuning.round_pause_ms, |game| game.finish_round());
    }

    fn finish_round(&self) {
        let mut state = self.lock();
        if state.phase != DuelPhase::RoundOver {
            return;
        }
        if state.round >= self.tuning.rounds {
            self.end_game(&mut state);
        } else {
            state.phase = DuelPhase::Waiting;
            self.core.harness.update(GameUpdate::ZonesReset);
            self.core.harness.message_both("TAP TO NEXT ROUND");
        }
    }

    fn end_game(&self, state: &mut DuelState) {
        state.phase = DuelPhase::Ended;
        // Final ties go to slot one.
        let winner = if state.scores[PlayerSlot::One.index()] >= state.scores[PlayerSlot::Two.index()]
        {
            PlayerSlot::One
        } else {
            PlayerSlot::Two
        };
        self.core
            .harness
            .message_both(format!("GAME OVER! {winner} WINS!"));
        self.core.harness.update(GameUpdate::GameOver { winner });

        self.after_ms(self.tuning.end_delay_ms, |game| game.core.harness.complete());
    }
}

impl HasCore for QuickdrawDuel {
    fn core(&self) -> &GameCore {
        &self.core
    }
}

impl Minigame for QuickdrawDuel {
    fn kind(&self) -> GameKind {
        GameKind::Quickdraw
    }

    fn init(&self) {
        if !self.core.begin_init() {
            return;
        }
        self.core
            .harness
            .update(GameUpdate::Scoreboard { scores: [0, 0] });
        self.core.harness.message_both("TAP TO START");
    }

    fn handle_input(&self, slot: PlayerSlot, input: PlayerInput) {
        if self.core.is_torn_down() || input != PlayerInput::Tap {
            return;
        }
        let mut state = self.lock();
        match state.phase {
            DuelPhase::Waiting => self.start_round(&mut state),
            DuelPhase::Ready => self.foul(&mut state, slot),
            DuelPhase::Draw => self.round_won(&mut state, slot),
            DuelPhase::RoundOver | DuelPhase::Ended => {}
        }
    }

    fn scores(&self) -> [u32; 2] {
        self.lock().scores
    }

    fn phase_label(&self) -> &'static str {
        match self.lock().phase {
            DuelPhase::Waiting => "waiting",
            DuelPhase::Ready => "ready",
            DuelPhase::Draw => "draw",
            DuelPhase::RoundOver => "round_over",
            DuelPhase::Ended => "ended",
        }
    }

    fn cleanup(&self) {
        if self.core.teardown() {
            debug!(game = %GameKind::Quickdraw, "instance torn down");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::{broadcast, oneshot};
    use tokio::time::sleep;

    use super::*;
    use crate::games::harness::{CompletionHandle, CuePlayer, UpdateHub};

    fn duel(
        tuning: QuickdrawTuning,
    ) -> (
        Arc<QuickdrawDuel>,
        broadcast::Receiver<GameUpdate>,
        oneshot::Receiver<()>,
    ) {
        let hub = UpdateHub::new(1024);
        let cues = Arc::new(CuePlayer::new(hub.clone()));
        cues.enable();
        let (tx, rx) = oneshot::channel();
        let harness = GameHarness::new(hub.clone(), cues, CompletionHandle::new(tx));
        let game = QuickdrawDuel::new(tuning, harness);
        game.init();
        (game, hub.subscribe(), rx)
    }

    fn drain(receiver: &mut broadcast::Receiver<GameUpdate>) -> Vec<GameUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = receiver.try_recv() {
            updates.push(update);
        }
        updates
    }

    #[tokio::test(start_paused = true)]
    async fn tap_while_armed_is_a_foul_for_the_opponent() {
        let (game, _rx, _done) = duel(QuickdrawTuning::default());

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        assert_eq!(game.phase_label(), "ready");

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        assert_eq!(game.scores(), [0, 1]);
        assert_eq!(game.phase_label(), "round_over");
    }

    #[tokio::test(start_paused = true)]
    async fn tap_on_the_draw_signal_wins_the_round() {
        let (game, mut rx, _done) = duel(QuickdrawTuning::default());

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        // The draw delay is below 9s; sleeping past it guarantees the signal.
        sleep(Duration::from_millis(9100)).await;
        tokio::task::yield_now().await;
        assert_eq!(game.phase_label(), "draw");

        drain(&mut rx);
        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);
        assert_eq!(game.scores(), [0, 1]);
        assert!(drain(&mut rx).iter().any(|update| matches!(
            update,
            GameUpdate::RoundOutcome {
                winner: PlayerSlot::Two
            }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn taps_during_round_resolution_are_ignored() {
        let (game, _rx, _done) = duel(QuickdrawTuning::default());

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);
        assert_eq!(game.scores(), [1, 0]);

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);
        assert_eq!(game.scores(), [1, 0]);

        sleep(Duration::from_millis(2100)).await;
        tokio::task::yield_now().await;
        assert_eq!(game.phase_label(), "waiting");
    }

    #[tokio::test(start_paused = true)]
    async fn foul_cancels_the_pending_draw_signal() {
        let (game, mut rx, _done) = duel(QuickdrawTuning::default());

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);
        drain(&mut rx);

        sleep(Duration::from_millis(12_000)).await;
        tokio::task::yield_now().await;

        let late = drain(&mut rx);
        assert!(!late.iter().any(|update| matches!(
            update,
            GameUpdate::Cue(Cue::Impact)
                | GameUpdate::CenterCue { text: Some(_) }
        )));
        assert_eq!(game.scores(), [1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn five_fouls_end_the_duel_and_fire_completion() {
        let (game, mut rx, mut done) = duel(QuickdrawTuning::default());

        for _ in 0..5 {
            game.handle_input(PlayerSlot::One, PlayerInput::Tap);
            game.handle_input(PlayerSlot::One, PlayerInput::Tap);
            sleep(Duration::from_millis(2100)).await;
            tokio::task::yield_now().await;
        }

        assert_eq!(game.phase_label(), "ended");
        assert_eq!(game.scores(), [0, 5]);
        assert!(drain(&mut rx).iter().any(|update| matches!(
            update,
            GameUpdate::GameOver {
                winner: PlayerSlot::Two
            }
        )));

        assert!(done.try_recv().is_err());
        sleep(Duration::from_millis(3100)).await;
        tokio::task::yield_now().await;
        assert!(done.try_recv().is_ok());

        // Terminal state accepts no further input.
        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        assert_eq!(game.scores(), [0, 5]);
        assert_eq!(game.phase_label(), "ended");
    }

    #[tokio::test(start_paused = true)]
    async fn final_tie_goes_to_slot_one() {
        let tuning = QuickdrawTuning {
            rounds: 2,
            ..QuickdrawTuning::default()
        };
        let (game, mut rx, _done) = duel(tuning);

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);
        sleep(Duration::from_millis(2100)).await;
        tokio::task::yield_now().await;

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        sleep(Duration::from_millis(2100)).await;
        tokio::task::yield_now().await;

        assert_eq!(game.scores(), [1, 1]);
        assert!(drain(&mut rx).iter().any(|update| matches!(
            update,
            GameUpdate::GameOver {
                winner: PlayerSlot::One
            }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_is_idempotent_and_silences_everything() {
        let (game, mut rx, mut done) = duel(QuickdrawTuning::default());

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        game.cleanup();
        game.cleanup();
        assert_eq!(game.core.timers.pending(), 0);
        drain(&mut rx);

        sleep(Duration::from_millis(15_000)).await;
        tokio::task::yield_now().await;
        assert!(drain(&mut rx).is_empty());
        assert!(done.try_recv().is_err());

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        assert_eq!(game.scores(), [0, 0]);
    }
}
