//! Minigame engine: the shared instance contract, the per-variant state
//! machines, and the timer scheduling they rely on.

pub mod arithmetic;
pub mod harness;
pub mod quickdraw;
pub mod rhythm;
pub mod stroop;
pub mod timer;

use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use self::{
    arithmetic::{ArithmeticRace, ArithmeticTuning},
    harness::GameHarness,
    quickdraw::{QuickdrawDuel, QuickdrawTuning},
    rhythm::{RhythmRace, RhythmTuning},
    stroop::{StroopMatch, StroopTuning},
    timer::TimerPool,
};

/// One of the two player positions sharing the screen.
///
/// Internally 0-indexed through [`PlayerSlot::index`]; every player-facing
/// message uses the 1-indexed [`PlayerSlot::number`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerSlot {
    /// The zone rendered upside down for the facing player.
    One,
    /// The zone rendered upright for the holding player.
    Two,
}

impl PlayerSlot {
    /// Both slots, in slot order.
    pub const BOTH: [PlayerSlot; 2] = [PlayerSlot::One, PlayerSlot::Two];

    /// The other slot.
    pub fn opponent(self) -> Self {
        match self {
            PlayerSlot::One => PlayerSlot::Two,
            PlayerSlot::Two => PlayerSlot::One,
        }
    }

    /// 0-based index into score/progress arrays.
    pub fn index(self) -> usize {
        match self {
            PlayerSlot::One => 0,
            PlayerSlot::Two => 1,
        }
    }

    /// 1-based number used in player-facing messaging.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Parse a 1-based slot number.
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(PlayerSlot::One),
            2 => Some(PlayerSlot::Two),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.number())
    }
}

/// An input event arriving from a player zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerInput {
    /// A plain tap anywhere in the zone.
    Tap,
    /// Selection of an answer choice by value.
    Answer(i64),
}

/// Identifier of a minigame variant, used in routes and the menu catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Reaction duel with false cues.
    Quickdraw,
    /// Word/ink match standoff.
    Stroop,
    /// Shared-problem arithmetic race.
    Arithmetic,
    /// Beat-timing rowing race.
    Rhythm,
}

impl GameKind {
    /// Stable identifier used in URLs and events.
    pub fn slug(self) -> &'static str {
        match self {
            GameKind::Quickdraw => "quickdraw",
            GameKind::Stroop => "stroop",
            GameKind::Arithmetic => "arithmetic",
            GameKind::Rhythm => "rhythm",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error returned when a variant identifier is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game `{0}`")]
pub struct UnknownGame(pub String);

impl FromStr for GameKind {
    type Err = UnknownGame;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "quickdraw" => Ok(GameKind::Quickdraw),
            "stroop" => Ok(GameKind::Stroop),
            "arithmetic" => Ok(GameKind::Arithmetic),
            "rhythm" => Ok(GameKind::Rhythm),
            other => Err(UnknownGame(other.to_string())),
        }
    }
}

/// Menu metadata for one variant.
#[derive(Debug, Clone, Copy)]
pub struct GameMeta {
    /// Display title.
    pub title: &'static str,
    /// One-line pitch shown under the title.
    pub tagline: &'static str,
}

/// The menu catalog, in presentation order.
pub fn catalog() -> IndexMap<GameKind, GameMeta> {
    IndexMap::from([
        (
            GameKind::Quickdraw,
            GameMeta {
                title: "Quickdraw",
                tagline: "Wait for the bang. Tap first. Don't get baited.",
            },
        ),
        (
            GameKind::Stroop,
            GameMeta {
                title: "Color Clash",
                tagline: "Tap only when the word matches its ink.",
            },
        ),
        (
            GameKind::Arithmetic,
            GameMeta {
                title: "Math Race",
                tagline: "Same problem, first correct answer scores.",
            },
        ),
        (
            GameKind::Rhythm,
            GameMeta {
                title: "Row Rhythm",
                tagline: "Tap on the beat to row across the line.",
            },
        ),
    ])
}

/// Half-open interval of milliseconds sampled for randomized delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    /// Inclusive lower bound.
    pub min_ms: u64,
    /// Exclusive upper bound.
    pub max_ms: u64,
}

impl DelayRange {
    /// Build a range; callers are expected to keep `min_ms < max_ms`.
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Draw a uniform delay from the range, in milliseconds.
    pub fn sample(&self, rng: &mut impl Rng) -> u64 {
        if self.min_ms >= self.max_ms {
            return self.min_ms;
        }
        rng.random_range(self.min_ms..self.max_ms)
    }
}

/// Per-variant tuning blocks, defaulting to the shipped game constants.
#[derive(Debug, Clone, Default)]
pub struct GameTunings {
    /// Reaction duel knobs.
    pub quickdraw: QuickdrawTuning,
    /// Word/ink match knobs.
    pub stroop: StroopTuning,
    /// Arithmetic race knobs.
    pub arithmetic: ArithmeticTuning,
    /// Rhythm race knobs.
    pub rhythm: RhythmTuning,
}

/// Contract every minigame variant implements for the host shell.
///
/// One instance is live at a time. `init` renders the initial state,
/// `handle_input` feeds it slot-tagged events, and `cleanup` tears it down:
/// after cleanup no timer, cue, or score mutation may surface, and calling
/// `cleanup` again (or without `init`) is a no-op.
pub trait Minigame: Send + Sync {
    /// Which variant this instance is.
    fn kind(&self) -> GameKind;

    /// Render the initial state and arm the instance. First call wins;
    /// repeated calls are ignored.
    fn init(&self);

    /// Feed one input event tagged with its originating slot.
    fn handle_input(&self, slot: PlayerSlot, input: PlayerInput);

    /// Current scores (or progress) per slot.
    fn scores(&self) -> [u32; 2];

    /// Short label of the current phase, for snapshots and logs.
    fn phase_label(&self) -> &'static str;

    /// Cancel all pending timers and loops and release the zones. Idempotent.
    fn cleanup(&self);
}

/// Construct a variant instance wired to `harness`.
pub fn build(kind: GameKind, tunings: &GameTunings, harness: GameHarness) -> Arc<dyn Minigame> {
    match kind {
        GameKind::Quickdraw => QuickdrawDuel::new(tunings.quickdraw.clone(), harness),
        GameKind::Stroop => StroopMatch::new(tunings.stroop.clone(), harness),
        GameKind::Arithmetic => ArithmeticRace::new(tunings.arithmetic.clone(), harness),
        GameKind::Rhythm => RhythmRace::new(tunings.rhythm.clone(), harness),
    }
}

/// Lifecycle scaffolding shared by every variant: the capability harness,
/// the owned timer pool, and the init/teardown latches.
pub(crate) struct GameCore {
    pub(crate) harness: GameHarness,
    pub(crate) timers: TimerPool,
    initialized: AtomicBool,
    torn_down: AtomicBool,
}

impl GameCore {
    pub(crate) fn new(harness: GameHarness) -> Self {
        Self {
            harness,
            timers: TimerPool::new(),
            initialized: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Returns true exactly once, on the first `init` call.
    pub(crate) fn begin_init(&self) -> bool {
        !self.initialized.swap(true, Ordering::SeqCst)
    }

    /// Cancel everything and mark the instance dead. Returns true on the
    /// first teardown only.
    pub(crate) fn teardown(&self) -> bool {
        self.timers.cancel_all();
        !self.torn_down.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }
}

/// Access to a variant's shared core, required by [`after`].
pub(crate) trait HasCore: Send + Sync + 'static {
    fn core(&self) -> &GameCore;
}

/// Schedule `action` on `game` after `delay`, guarded against staleness.
///
/// The action holds only a weak reference and the timer epoch captured now:
/// if the instance was dropped, or any cancellation ran in between, the
/// action silently does nothing. Variants additionally re-check the phase
/// they scheduled for inside `action`.
pub(crate) fn after<G, F>(game: &Arc<G>, delay: Duration, action: F)
where
    G: HasCore,
    F: FnOnce(&G) + Send + 'static,
{
    let weak = Arc::downgrade(game);
    let epoch = game.core().timers.epoch();
    game.core().timers.schedule(delay, async move {
        let Some(game) = weak.upgrade() else {
            return;
        };
        if !game.core().timers.is_current(epoch) {
            return;
        }
        action(&game);
    });
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn slots_mirror_each_other() {
        assert_eq!(PlayerSlot::One.opponent(), PlayerSlot::Two);
        assert_eq!(PlayerSlot::Two.opponent(), PlayerSlot::One);
        assert_eq!(PlayerSlot::One.number(), 1);
        assert_eq!(PlayerSlot::Two.index(), 1);
        assert_eq!(PlayerSlot::from_number(2), Some(PlayerSlot::Two));
        assert_eq!(PlayerSlot::from_number(3), None);
        assert_eq!(PlayerSlot::One.to_string(), "P1");
    }

    #[test]
    fn kind_slugs_round_trip() {
        for kind in [
            GameKind::Quickdraw,
            GameKind::Stroop,
            GameKind::Arithmetic,
            GameKind::Rhythm,
        ] {
            assert_eq!(kind.slug().parse::<GameKind>(), Ok(kind));
        }
        assert!("pinball".parse::<GameKind>().is_err());
    }

    #[test]
    fn catalog_lists_all_variants_in_menu_order() {
        let catalog = catalog();
        let kinds: Vec<GameKind> = catalog.keys().copied().collect();
        assert_eq!(
            kinds,
            vec![
                GameKind::Quickdraw,
                GameKind::Stroop,
                GameKind::Arithmetic,
                GameKind::Rhythm,
            ]
        );
    }

    #[test]
    fn delay_range_samples_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let range = DelayRange::new(3000, 9000);
        for _ in 0..500 {
            let value = range.sample(&mut rng);
            assert!((3000..9000).contains(&value));
        }
    }

    #[test]
    fn degenerate_delay_range_returns_lower_bound() {
        let mut rng = StdRng::seed_from_u64(11);
        assert_eq!(DelayRange::new(500, 500).sample(&mut rng), 500);
    }
}
