//! Arithmetic race: both players stare down the same problem and race to pick
//! the correct answer; a wrong pick freezes that player for a moment.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};

use rand::{Rng, seq::SliceRandom};
use tracing::debug;

use crate::games::{
    GameCore, GameKind, HasCore, Minigame, PlayerInput, PlayerSlot, after,
    harness::{Cue, GameHarness, GameUpdate},
};

/// Answers presented per problem: the correct one plus two distractors.
const ANSWER_COUNT: usize = 3;

/// The three operators problems are drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    /// Addition, operands 1..=20.
    Add,
    /// Subtraction, minuend 5..=24, subtrahend below the minuend.
    Sub,
    /// Multiplication, operands 2..=10.
    Mul,
}

impl Operator {
    /// Symbol used in the rendered problem text.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "×",
        }
    }

    fn apply(self, a: i64, b: i64) -> i64 {
        match self {
            Operator::Add => a + b,
            Operator::Sub => a - b,
            Operator::Mul => a * b,
        }
    }
}

/// A generated arithmetic problem shared by both slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    /// Rendered problem text, e.g. `7 + 5`.
    pub text: String,
    /// The correct result.
    pub answer: i64,
}

impl Problem {
    /// Draw an operator and operands; subtraction never goes negative and
    /// multiplication stays mentally tractable.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let operator = [Operator::Add, Operator::Sub, Operator::Mul][rng.random_range(0..3)];
        let (a, b) = match operator {
            Operator::Add => (rng.random_range(1..=20), rng.random_range(1..=20)),
            Operator::Sub => {
                let a = rng.random_range(5..=24);
                (a, rng.random_range(0..a))
            }
            Operator::Mul => (rng.random_range(2..=10), rng.random_range(2..=10)),
        };
        Self {
            text: format!("{a} {} {b}", operator.symbol()),
            answer: operator.apply(a, b),
        }
    }

    /// The correct answer plus distinct non-negative distractors within ±5,
    /// in shuffled presentation order.
    pub fn answer_choices(&self, rng: &mut impl Rng) -> Vec<i64> {
        let mut choices = vec![self.answer];
        while choices.len() < ANSWER_COUNT {
            let magnitude = rng.random_range(1..=5);
            let candidate = if rng.random_bool(0.5) {
                self.answer + magnitude
            } else {
                self.answer - magnitude
            };
            if candidate >= 0 && !choices.contains(&candidate) {
                choices.push(candidate);
            }
        }
        choices.shuffle(rng);
        choices
    }
}

/// Timing and scoring knobs for the arithmetic race.
#[derive(Debug, Clone)]
pub struct ArithmeticTuning {
    /// Score a slot must reach to win.
    pub winning_score: u32,
    /// How long a wrong answer freezes the offending slot.
    pub freeze_ms: u64,
    /// Display time of the final result before completion fires.
    pub end_delay_ms: u64,
}

impl Default for ArithmeticTuning {
    fn default() -> Self {
        Self {
            winning_score: 5,
            freeze_ms: 2000,
            end_delay_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RacePhase {
    /// Waiting for the first start tap; selections are ignored.
    Idle,
    /// Problems flowing; selections are judged per slot.
    Playing,
    /// Someone reached the cap; terminal.
    Ended,
}

struct RaceState {
    phase: RacePhase,
    scores: [u32; 2],
    frozen: [bool; 2],
    problem: Option<Problem>,
}

/// Arithmetic race instance. See the module docs for the flow.
pub struct ArithmeticRace {
    me: Weak<ArithmeticRace>,
    core: GameCore,
    tuning: ArithmeticTuning,
    state: Mutex<RaceState>,
}

impl ArithmeticRace {
    /// Build an idle race wired to `harness`.
    pub fn new(tuning: ArithmeticTuning, harness: GameHarness) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            core: GameCore::new(harness),
            tuning,
            state: Mutex::new(RaceState {
                phase: RacePhase::Idle,
                scores: [0, 0],
                frozen: [false, false],
                problem: None,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn after_ms(&self, delay_ms: u64, action: impl FnOnce(&Self) + Send + 'static) {
        if let Some(me) = self.me.upgrade() {
            after(&me, Duration::from_millis(delay_ms), action);
        }
    }

    fn start_game(&self, state: &mut RaceState) {
        state.phase = RacePhase::Playing;
        self.core.harness.message_both("");
        self.next_problem(state);
    }

    /// Generate and present the next shared problem.
    fn next_problem(&self, state: &mut RaceState) {
        let mut rng = rand::rng();
        let problem = Problem::generate(&mut rng);
        let answers = problem.answer_choices(&mut rng);
        self.core.harness.update(GameUpdate::Problem {
            text: problem.text.clone(),
            answers,
        });
        state.problem = Some(problem);
    }

    fn handle_answer(&self, state: &mut RaceState, slot: PlayerSlot, value: i64) {
        if state.frozen[slot.index()] {
            return;
        }
        let Some(problem) = &state.problem else {
            return;
        };

        if value == problem.answer {
            self.score(state, slot);
        } else {
            self.freeze(state, slot);
        }
    }

    fn score(&self, state: &mut RaceState, slot: PlayerSlot) {
        state.scores[slot.index()] += 1;
        self.core.harness.cue(Cue::Click);
        self.core.harness.update(GameUpdate::Scoreboard {
            scores: state.scores,
        });

        if state.scores[slot.index()] >= self.tuning.winning_score {
            self.end_game(state, slot);
        } else {
            self.next_problem(state);
        }
    }

    /// Wrong answer: the slot sits out the penalty, the opponent races on.
    fn freeze(&self, state: &mut RaceState, slot: PlayerSlot) {
        state.frozen[slot.index()] = true;
        self.core
            .harness
            .update(GameUpdate::Freeze { slot, frozen: true });
        self.core.harness.message(slot, "FROZEN!");
        self.core.harness.cue(Cue::Failure);

        self.after_ms(self.tuning.freeze_ms, move |game| game.unfreeze(slot));
    }

    fn unfreeze(&self, slot: PlayerSlot) {
        let mut state = self.lock();
        if state.phase != RacePhase::Playing || !state.frozen[slot.index()] {
            return;
        }
        state.frozen[slot.index()] = false;
        self.core.harness.update(GameUpdate::Freeze {
            slot,
            frozen: false,
        });
        self.core.harness.message(slot, "");
    }

    fn end_game(&self, state: &mut RaceState, winner: PlayerSlot) {
        state.phase = RacePhase::Ended;
        self.core.timers.cancel_all();
        self.core.harness.message_both(format!("{winner} WINS!"));
        self.core.harness.update(GameUpdate::GameOver { winner });
        self.core.harness.cue(Cue::Success);

        self.after_ms(self.tuning.end_delay_ms, |game| game.core.harness.complete());
    }
}

impl HasCore for ArithmeticRace {
    fn core(&self) -> &GameCore {
        &self.core
    }
}

impl Minigame for ArithmeticRace {
    fn kind(&self) -> GameKind {
        GameKind::Arithmetic
    }

    fn init(&self) {
        if !self.core.begin_init() {
            return;
        }
        self.core
            .harness
            .update(GameUpdate::Scoreboard { scores: [0, 0] });
        self.core.harness.message_both("READY?");
    }

    fn handle_input(&self, slot: PlayerSlot, input: PlayerInput) {
        if self.core.is_torn_down() {
            return;
        }
        let mut state = self.lock();
        match (state.phase, input) {
            (RacePhase::Idle, PlayerInput::Tap) => self.start_game(&mut state),
            (RacePhase::Playing, PlayerInput::Answer(value)) => {
                self.handle_answer(&mut state, slot, value)
            }
            _ => {}
        }
    }

    fn scores(&self) -> [u32; 2] {
        self.lock().scores
    }

    fn phase_label(&self) -> &'static str {
        match self.lock().phase {
            RacePhase::Idle => "idle",
            RacePhase::Playing => "playing",
            RacePhase::Ended => "ended",
        }
    }

    fn cleanup(&self) {
        if self.core.teardown() {
            debug!(game = %GameKind::Arithmetic, "instance torn down");
        }
    }
}
