//! Word/ink match standoff: cards flash in the center, most of them lying
//! about their own color. Tap on a genuine match, never on a mismatch.

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

/// The four words a card can show, doubling as the four ink colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorWord {
    /// "RED", ink #ff0055.
    Red,
    /// "BLUE", ink #0099db.
    Blue,
    /// "GREEN", ink #00cc66.
    Green,
    /// "YELLOW", ink #ffcc00.
    Yellow,
}

impl ColorWord {
    /// The full palette, in a fixed order.
    pub const ALL: [ColorWord; 4] = [
        ColorWord::Red,
        ColorWord::Blue,
        ColorWord::Green,
        ColorWord::Yellow,
    ];

    /// Upper-case word as printed on the card.
    pub fn word(self) -> &'static str {
        match self {
            ColorWord::Red => "RED",
            ColorWord::Blue => "BLUE",
            ColorWord::Green => "GREEN",
            ColorWord::Yellow => "YELLOW",
        }
    }

    /// CSS hex value the frontend paints the word with.
    pub fn hex(self) -> &'static str {
        match self {
            ColorWord::Red => "#ff0055",
            ColorWord::Blue => "#0099db",
            ColorWord::Green => "#00cc66",
            ColorWord::Yellow => "#ffcc00",
        }
    }
}

/// One generated card: a word painted in some ink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StroopCard {
    /// The word printed on the card.
    pub word: ColorWord,
    /// The ink the word is painted in.
    pub ink: ColorWord,
}

impl StroopCard {
    /// Draw word and ink independently and uniformly from the palette.
    pub fn generate(rng: &mut impl Rng) -> Self {
        Self {
            word: ColorWord::ALL[rng.random_range(0..ColorWord::ALL.len())],
            ink: ColorWord::ALL[rng.random_range(0..ColorWord::ALL.len())],
        }
    }

    /// True iff the word names its own ink.
    pub fn is_match(self) -> bool {
        self.word == self.ink
    }
}

/// Timing and scoring knobs for the match standoff.
#[derive(Debug, Clone)]
pub struct StroopTuning {
    /// Score a slot must reach to win.
    pub winning_score: u32,
    /// Random quiet time before the next card is revealed.
    pub reveal_delay: DelayRange,
    /// How long a mismatch card stays up before it hides itself.
    pub fakeout_visible_ms: u64,
    /// Pause after a point before the next quiet period starts.
    pub interstitial_ms: u64,
    /// Display time of the final result before completion fires.
    pub end_delay_ms: u64,
}

impl Default for StroopTuning {
    fn default() -> Self {
        Self {
            winning_score: 5,
            reveal_delay: DelayRange::new(2000, 5000),
            fakeout_visible_ms: 1000,
            interstitial_ms: 2000,
            end_delay_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchPhase {
    /// No card showing; taps are ignored.
    Waiting,
    /// A card is up. Tapping a match scores, tapping a mismatch is a foul.
    Standoff,
    /// Someone reached the cap; terminal.
    Ended,
}

struct MatchState {
    phase: MatchPhase,
    scores: [u32; 2],
    card: Option<StroopCard>,
}

/// Word/ink match instance. See the module docs for the flow.
pub struct StroopMatch {
    me: Weak<StroopMatch>,
    core: GameCore,
    tuning: StroopTuning,
    state: Mutex<MatchState>,
}

impl StroopMatch {
    /// Build an idle match wired to `harness`.
    pub fn new(tuning: StroopTuning, harness: GameHarness) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            core: GameCore::new(harness),
            tuning,
            state: Mutex::new(MatchState {
                phase: MatchPhase::Waiting,
                scores: [0, 0],
                card: None,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, MatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn after_ms(&self, delay_ms: u64, action: impl FnOnce(&Self) + Send + 'static) {
        if let Some(me) = self.me.upgrade() {
            after(&me, Duration::from_millis(delay_ms), action);
        }
    }

    /// Hide the card, clear messages, and arm the next random reveal.
    fn begin_waiting(&self, state: &mut MatchState) {
        state.phase = MatchPhase::Waiting;
        state.card = None;
        self.core.harness.update(GameUpdate::CardHidden);
        self.core.harness.message_both("");

        let delay = self.tuning.reveal_delay.sample(&mut rand::rng());
        self.after_ms(delay, |game| game.reveal_card());
    }

    fn reveal_card(&self) {
        let mut state = self.lock();
        if state.phase != MatchPhase::Waiting {
            return;
        }
        let card = StroopCard::generate(&mut rand::rng());
        self.show_card(&mut state, card);
    }

    fn show_card(&self, state: &mut MatchState, card: StroopCard) {
        state.card = Some(card);
        state.phase = MatchPhase::Standoff;
        self.core.harness.update(GameUpdate::Card(card));

        if card.is_match() {
            // Genuine go-signal: hold the card and wait for a tap.
            self.core.harness.cue(Cue::Impact);
        } else {
            self.core.harness.cue(Cue::Tone);
            self.after_ms(self.tuning.fakeout_visible_ms, move |game| {
                game.hide_fakeout(card)
            });
        }
    }

    fn hide_fakeout(&self, card: StroopCard) {
        let mut state = self.lock();
        if state.phase != MatchPhase::Standoff || state.card != Some(card) || card.is_match() {
            return;
        }
        self.begin_waiting(&mut state);
    }

    fn handle_tap(&self, state: &mut MatchState, slot: PlayerSlot) {
        let Some(card) = state.card else {
            return;
        };
        self.core.timers.cancel_all();

        let scorer = if card.is_match() {
            self.core.harness.message_both(format!("{slot} POINT!"));
            self.core.harness.cue(Cue::Success);
            slot
        } else {
            // Fell for the fakeout: the opponent collects.
            self.core.harness.message(slot, "FOUL!");
            self.core.harness.cue(Cue::Failure);
            slot.opponent()
        };

        state.card = None;
        state.phase = MatchPhase::Waiting;
        self.core.harness.update(GameUpdate::CardHidden);

        state.scores[scorer.index()] += 1;
        self.core.harness.update(GameUpdate::Scoreboard {
            scores: state.scores,
        });

        if state.scores[scorer.index()] >= self.tuning.winning_score {
            self.end_game(state, scorer);
        } else {
            self.after_ms(self.tuning.interstitial_ms, |game| game.next_round());
        }
    }

    fn next_round(&self) {
        let mut state = self.lock();
        if state.phase != MatchPhase::Waiting {
            return;
        }
        self.begin_waiting(&mut state);
    }

    fn end_game(&self, state: &mut MatchState, winner: PlayerSlot) {
        state.phase = MatchPhase::Ended;
        self.core.harness.message_both(format!("{winner} WINS!"));
        self.core.harness.update(GameUpdate::GameOver { winner });
        self.core.harness.cue(Cue::Success);

        self.after_ms(self.tuning.end_delay_ms, |game| game.core.harness.complete());
    }
}

impl HasCore for StroopMatch {
    fn core(&self) -> &GameCore {
        &self.core
    }
}

impl Minigame for StroopMatch {
    fn kind(&self) -> GameKind {
        GameKind::Stroop
    }

    fn init(&self) {
        if !self.core.begin_init() {
            return;
        }
        self.core
            .harness
            .update(GameUpdate::Scoreboard { scores: [0, 0] });
        self.core.harness.message_both("TAP ON MATCH!");

        let mut state = self.lock();
        self.begin_waiting(&mut state);
    }

    fn handle_input(&self, slot: PlayerSlot, input: PlayerInput) {
        if self.core.is_torn_down() || input != PlayerInput::Tap {
            return;
        }
        let mut state = self.lock();
        match state.phase {
            MatchPhase::Standoff => self.handle_tap(&mut state, slot),
            MatchPhase::Waiting | MatchPhase::Ended => {}
        }
    }

    fn scores(&self) -> [u32; 2] {
        self.lock().scores
    }

    fn phase_label(&self) -> &'static str {
        match self.lock().phase {
            MatchPhase::Waiting => "waiting",
            MatchPhase::Standoff => "standoff",
            MatchPhase::Ended => "ended",
        }
    }

    fn cleanup(&self) {
        if self.core.teardown() {
            debug!(game = %GameKind::Stroop, "instance torn down");
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use tokio::sync::{broadcast, oneshot};
    use tokio::time::sleep;

    use super::*;
    use crate::games::harness::{CompletionHandle, CuePlayer, UpdateHub};

    const MATCH_CARD: StroopCard = StroopCard {
        word: ColorWord::Red,
        ink: ColorWord::Red,
    };
    const FAKEOUT_CARD: StroopCard = StroopCard {
        word: ColorWord::Red,
        ink: ColorWord::Blue,
    };

    fn stroop(
        tuning: StroopTuning,
    ) -> (
        Arc<StroopMatch>,
        broadcast::Receiver<GameUpdate>,
        oneshot::Receiver<()>,
    ) {
        let hub = UpdateHub::new(1024);
        let cues = Arc::new(CuePlayer::new(hub.clone()));
        cues.enable();
        let (tx, rx) = oneshot::channel();
        let harness = GameHarness::new(hub.clone(), cues, CompletionHandle::new(tx));
        let game = StroopMatch::new(tuning, harness);
        game.init();
        (game, hub.subscribe(), rx)
    }

    fn force_card(game: &Arc<StroopMatch>, card: StroopCard) {
        let mut state = game.lock();
        game.core.timers.cancel_all();
        game.show_card(&mut state, card);
    }

    fn drain(receiver: &mut broadcast::Receiver<GameUpdate>) -> Vec<GameUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = receiver.try_recv() {
            updates.push(update);
        }
        updates
    }

    #[test]
    fn card_matches_exactly_when_word_names_its_ink() {
        assert!(MATCH_CARD.is_match());
        assert!(!FAKEOUT_CARD.is_match());

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let card = StroopCard::generate(&mut rng);
            assert_eq!(card.is_match(), card.word == card.ink);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fakeout_card_hides_itself_and_rearms() {
        let (game, mut rx, _done) = stroop(StroopTuning::default());

        force_card(&game, FAKEOUT_CARD);
        assert_eq!(game.phase_label(), "standoff");
        drain(&mut rx);

        sleep(Duration::from_millis(1100)).await;
        tokio::task::yield_now().await;
        assert_eq!(game.phase_label(), "waiting");
        assert!(drain(&mut rx)
            .iter()
            .any(|update| matches!(update, GameUpdate::CardHidden)));
        assert!(game.core.timers.pending() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn match_card_waits_for_a_tap() {
        let (game, _rx, _done) = stroop(StroopTuning::default());

        force_card(&game, MATCH_CARD);
        sleep(Duration::from_millis(6000)).await;
        tokio::task::yield_now().await;
        assert_eq!(game.phase_label(), "standoff");
    }

    #[tokio::test(start_paused = true)]
    async fn tap_on_match_scores_the_tapper() {
        let (game, _rx, _done) = stroop(StroopTuning::default());

        force_card(&game, MATCH_CARD);
        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);
        assert_eq!(game.scores(), [0, 1]);
        assert_eq!(game.phase_label(), "waiting");
    }

    #[tokio::test(start_paused = true)]
    async fn tap_on_fakeout_scores_the_opponent() {
        let (game, mut rx, _done) = stroop(StroopTuning::default());

        force_card(&game, FAKEOUT_CARD);
        drain(&mut rx);
        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);
        assert_eq!(game.scores(), [1, 0]);
        assert!(drain(&mut rx).iter().any(|update| matches!(
            update,
            GameUpdate::Message {
                slot: Some(PlayerSlot::Two),
                ..
            }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn reaching_the_cap_ends_the_game() {
        let tuning = StroopTuning {
            winning_score: 1,
            ..StroopTuning::default()
        };
        let (game, mut rx, mut done) = stroop(tuning);

        force_card(&game, MATCH_CARD);
        game.handle_input(PlayerSlot::One, PlayerInput::Tap);

        assert_eq!(game.phase_label(), "ended");
        assert!(drain(&mut rx).iter().any(|update| matches!(
            update,
            GameUpdate::GameOver {
                winner: PlayerSlot::One
            }
        )));

        sleep(Duration::from_millis(3100)).await;
        tokio::task::yield_now().await;
        assert!(done.try_recv().is_ok());

        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);
        assert_eq!(game.scores(), [1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn taps_between_cards_are_ignored() {
        let (game, _rx, _done) = stroop(StroopTuning::default());

        assert_eq!(game.phase_label(), "waiting");
        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);
        assert_eq!(game.scores(), [0, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_empties_the_timer_pool() {
        let (game, _rx, _done) = stroop(StroopTuning::default());

        game.cleanup();
        game.cleanup();
        assert_eq!(game.core.timers.pending(), 0);
        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        assert_eq!(game.scores(), [0, 0]);
    }
}
