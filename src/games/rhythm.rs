//! Rhythm rowing race: a bar oscillates with a per-race beat period, and taps
//! are graded on how close the bar sits to the center when they land.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::debug;

use crate::games::{
    DelayRange, GameCore, GameKind, HasCore, Minigame, PlayerInput, PlayerSlot, after,
    harness::{Cue, GameHarness, GameUpdate},
};

/// Fraction of the current beat period elapsed at `elapsed`, in `[0, 1)`.
///
/// Pure on purpose: the render loop and the tap handler both call this, so
/// both observe identical values for the same timestamp.
pub fn phase_at(elapsed: Duration, period: Duration) -> f64 {
    if period.is_zero() {
        return 0.0;
    }
    let elapsed = elapsed.as_secs_f64();
    let period = period.as_secs_f64();
    (elapsed % period) / period
}

/// Oscillating bar position for a phase fraction, in `[0, 1]`.
///
/// A sine mapped so the bar sweeps 0.5 → 1 → 0.5 → 0 → 0.5 over one beat;
/// the hit target is the 0.5 center.
pub fn bar_position(phase: f64) -> f64 {
    ((phase * std::f64::consts::TAU).sin() + 1.0) / 2.0
}

/// Accuracy tier of a judged tap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Judgment {
    /// Within the tight window around the center.
    Perfect,
    /// Within the loose window.
    Good,
    /// Outside both windows; no progress.
    Miss,
}

impl Judgment {
    /// Grade a bar position against the tuning windows.
    pub fn of(position: f64, tuning: &RhythmTuning) -> Self {
        let offset = (position - 0.5).abs();
        if offset < tuning.perfect_window {
            Judgment::Perfect
        } else if offset < tuning.good_window {
            Judgment::Good
        } else {
            Judgment::Miss
        }
    }

    /// Progress units awarded for this tier.
    pub fn gain(self, tuning: &RhythmTuning) -> u32 {
        match self {
            Judgment::Perfect => tuning.perfect_gain,
            Judgment::Good => tuning.good_gain,
            Judgment::Miss => 0,
        }
    }

    /// Stable identifier used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Judgment::Perfect => "perfect",
            Judgment::Good => "good",
            Judgment::Miss => "miss",
        }
    }

    /// Player-facing flash text.
    pub fn label(self) -> &'static str {
        match self {
            Judgment::Perfect => "PERFECT!",
            Judgment::Good => "GOOD",
            Judgment::Miss => "MISS",
        }
    }

    fn cue(self) -> Cue {
        match self {
            Judgment::Perfect => Cue::Click,
            Judgment::Good => Cue::Tone,
            Judgment::Miss => Cue::Failure,
        }
    }
}

/// Timing and scoring knobs for the rowing race.
#[derive(Debug, Clone)]
pub struct RhythmTuning {
    /// Progress units needed to cross the finish line.
    pub goal: u32,
    /// Random per-race beat period, fixed once the race starts.
    pub beat_period: DelayRange,
    /// Center offset below which a tap is perfect.
    pub perfect_window: f64,
    /// Center offset below which a tap is still good.
    pub good_window: f64,
    /// Progress for a perfect tap.
    pub perfect_gain: u32,
    /// Progress for a good tap.
    pub good_gain: u32,
    /// Render loop tick interval.
    pub tick_interval_ms: u64,
    /// Display time of the final result before completion fires.
    pub end_delay_ms: u64,
}

impl Default for RhythmTuning {
    fn default() -> Self {
        Self {
            goal: 100,
            beat_period: DelayRange::new(600, 1000),
            perfect_window: 0.05,
            good_window: 0.15,
            perfect_gain: 5,
            good_gain: 2,
            tick_interval_ms: 33,
            end_delay_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowPhase {
    /// Before the first tap; either slot starts the race for both.
    Waiting,
    /// Race running; taps are graded.
    Racing,
    /// Someone crossed the line; terminal.
    Ended,
}

/// Beat reference fixed when the race starts.
#[derive(Debug, Clone, Copy)]
struct RaceClock {
    started_at: Instant,
    period: Duration,
}

impl RaceClock {
    fn position_now(&self) -> f64 {
        bar_position(phase_at(self.started_at.elapsed(), self.period))
    }
}

struct RowState {
    phase: RowPhase,
    progress: [u32; 2],
    clock: Option<RaceClock>,
}

/// Rhythm rowing race instance. See the module docs for the flow.
pub struct RhythmRace {
    me: Weak<RhythmRace>,
    core: GameCore,
    tuning: RhythmTuning,
    state: Mutex<RowState>,
}

impl RhythmRace {
    /// Build an idle race wired to `harness`.
    pub fn new(tuning: RhythmTuning, harness: GameHarness) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            core: GameCore::new(harness),
            tuning,
            state: Mutex::new(RowState {
                phase: RowPhase::Waiting,
                progress: [0, 0],
                clock: None,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn after_ms(&self, delay_ms: u64, action: impl FnOnce(&Self) + Send + 'static) {
        if let Some(me) = self.me.upgrade() {
            after(&me, Duration::from_millis(delay_ms), action);
        }
    }

    /// First tap from either slot: fix the beat and start both boats.
    fn start_race(&self, state: &mut RowState) {
        state.phase = RowPhase::Racing;
        let period_ms = self.tuning.beat_period.sample(&mut rand::rng());
        state.clock = Some(RaceClock {
            started_at: Instant::now(),
            period: Duration::from_millis(period_ms),
        });
        self.core.harness.message_both("ROW!");
        self.spawn_render_loop();
    }

    /// Continuous beat-bar broadcast; carries no scoring state.
    fn spawn_render_loop(&self) {
        let Some(me) = self.me.upgrade() else {
            return;
        };
        let weak = Arc::downgrade(&me);
        let epoch = self.core.timers.epoch();
        let tick = Duration::from_millis(self.tuning.tick_interval_ms);
        self.core.timers.spawn(async move {
            let mut ticker = interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(game) = weak.upgrade() else {
                    break;
                };
                if !game.core.timers.is_current(epoch) {
                    break;
                }
                game.broadcast_tick();
            }
        });
    }

    fn broadcast_tick(&self) {
        let state = self.lock();
        if state.phase != RowPhase::Racing {
            return;
        }
        let Some(clock) = state.clock else {
            return;
        };
        self.core.harness.update(GameUpdate::BeatTick {
            position: clock.position_now(),
        });
    }

    fn judge_tap(&self, state: &mut RowState, slot: PlayerSlot) {
        let Some(clock) = state.clock else {
            return;
        };
        let judgment = Judgment::of(clock.position_now(), &self.tuning);
        self.core.harness.update(GameUpdate::Judgment {
            slot,
            tier: judgment,
        });
        self.core.harness.message(slot, judgment.label());
        self.core.harness.cue(judgment.cue());

        let gain = judgment.gain(&self.tuning);
        if gain == 0 {
            return;
        }

        let index = slot.index();
        state.progress[index] = (state.progress[index] + gain).min(self.tuning.goal);
        self.core.harness.update(GameUpdate::Progress {
            slot,
            value: state.progress[index],
        });

        if state.progress[index] >= self.tuning.goal {
            self.end_race(state, slot);
        }
    }

    fn end_race(&self, state: &mut RowState, winner: PlayerSlot) {
        state.phase = RowPhase::Ended;
        self.core.timers.cancel_all();
        self.core.harness.message_both(format!("{winner} WINS!"));
        self.core.harness.update(GameUpdate::GameOver { winner });
        self.core.harness.cue(Cue::Success);

        self.after_ms(self.tuning.end_delay_ms, |game| game.core.harness.complete());
    }
}

impl HasCore for RhythmRace {
    fn core(&self) -> &GameCore {
        &self.core
    }
}

impl Minigame for RhythmRace {
    fn kind(&self) -> GameKind {
        GameKind::Rhythm
    }

    fn init(&self) {
        if !self.core.begin_init() {
            return;
        }
        for slot in PlayerSlot::BOTH {
            self.core
                .harness
                .update(GameUpdate::Progress { slot, value: 0 });
        }
        self.core.harness.message_both("TAP TO START");
    }

    fn handle_input(&self, slot: PlayerSlot, input: PlayerInput) {
        if self.core.is_torn_down() || input != PlayerInput::Tap {
            return;
        }
        let mut state = self.lock();
        match state.phase {
            RowPhase::Waiting => self.start_race(&mut state),
            RowPhase::Racing => self.judge_tap(&mut state, slot),
            RowPhase::Ended => {}
        }
    }

    fn scores(&self) -> [u32; 2] {
        self.lock().progress
    }

    fn phase_label(&self) -> &'static str {
        match self.lock().phase {
            RowPhase::Waiting => "waiting",
            RowPhase::Racing => "racing",
            RowPhase::Ended => "ended",
        }
    }

    fn cleanup(&self) {
        if self.core.teardown() {
            debug!(game = %GameKind::Rhythm, "instance torn down");
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::{broadcast, oneshot};
    use tokio::time::sleep;

    use super::*;
    use crate::games::harness::{CompletionHandle, CuePlayer, UpdateHub};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn race(
        tuning: RhythmTuning,
    ) -> (
        Arc<RhythmRace>,
        broadcast::Receiver<GameUpdate>,
        oneshot::Receiver<()>,
    ) {
        let hub = UpdateHub::new(4096);
        let cues = Arc::new(CuePlayer::new(hub.clone()));
        cues.enable();
        let (tx, rx) = oneshot::channel();
        let harness = GameHarness::new(hub.clone(), cues, CompletionHandle::new(tx));
        let game = RhythmRace::new(tuning, harness);
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

    #[test]
    fn phase_wraps_around_the_beat_period() {
        let period = Duration::from_millis(800);
        assert_close(phase_at(Duration::ZERO, period), 0.0);
        assert_close(phase_at(Duration::from_millis(200), period), 0.25);
        assert_close(phase_at(Duration::from_millis(1000), period), 0.25);
        assert_close(phase_at(Duration::ZERO, Duration::ZERO), 0.0);
    }

    #[test]
    fn bar_sweeps_through_the_sine_extremes() {
        assert_close(bar_position(0.0), 0.5);
        assert_close(bar_position(0.25), 1.0);
        assert_close(bar_position(0.5), 0.5);
        assert_close(bar_position(0.75), 0.0);
    }

    #[test]
    fn judgments_follow_the_center_windows() {
        let tuning = RhythmTuning::default();
        // Sine extremes (phase 0.25 / 0.75) sit 0.5 away from the center.
        assert_eq!(Judgment::of(bar_position(0.25), &tuning), Judgment::Miss);
        assert_eq!(Judgment::of(bar_position(0.75), &tuning), Judgment::Miss);
        assert_eq!(Judgment::of(0.5, &tuning), Judgment::Perfect);
        assert_eq!(Judgment::of(0.54, &tuning), Judgment::Perfect);
        assert_eq!(Judgment::of(0.55, &tuning), Judgment::Good);
        assert_eq!(Judgment::of(0.62, &tuning), Judgment::Good);
        assert_eq!(Judgment::of(0.65, &tuning), Judgment::Miss);
        assert_eq!(Judgment::of(0.35, &tuning), Judgment::Miss);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tap_starts_the_race_for_both_slots() {
        let (game, _rx, _done) = race(RhythmTuning::default());

        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);
        assert_eq!(game.phase_label(), "racing");
        assert_eq!(game.scores(), [0, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn tap_at_race_start_is_dead_center_perfect() {
        let (game, mut rx, _done) = race(RhythmTuning::default());

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        drain(&mut rx);
        // No time has passed on the paused clock: phase 0, bar at 0.5.
        game.handle_input(PlayerSlot::Two, PlayerInput::Tap);

        assert_eq!(game.scores(), [0, 5]);
        assert!(drain(&mut rx).iter().any(|update| matches!(
            update,
            GameUpdate::Judgment {
                slot: PlayerSlot::Two,
                tier: Judgment::Perfect
            }
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn crossing_the_goal_wins_and_completes() {
        let (game, mut rx, mut done) = race(RhythmTuning::default());

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        for _ in 0..20 {
            game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        }

        assert_eq!(game.phase_label(), "ended");
        assert_eq!(game.scores(), [100, 0]);
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
        assert_eq!(game.scores(), [100, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_is_clamped_at_the_goal() {
        let (game, _rx, _done) = race(RhythmTuning::default());

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        {
            let mut state = game.lock();
            state.progress = [98, 0];
        }
        game.handle_input(PlayerSlot::One, PlayerInput::Tap);

        assert_eq!(game.scores(), [100, 0]);
        assert_eq!(game.phase_label(), "ended");
    }

    #[tokio::test(start_paused = true)]
    async fn beat_ticks_flow_only_while_racing() {
        let (game, mut rx, _done) = race(RhythmTuning::default());

        game.handle_input(PlayerSlot::One, PlayerInput::Tap);
        sleep(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert!(drain(&mut rx)
            .iter()
            .any(|update| matches!(update, GameUpdate::BeatTick { .. })));

        game.cleanup();
        drain(&mut rx);
        sleep(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        assert!(!drain(&mut rx)
            .iter()
            .any(|update| matches!(update, GameUpdate::BeatTick { .. })));
        assert_eq!(game.core.timers.pending(), 0);
    }
}
