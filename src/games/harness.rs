use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::{broadcast, oneshot};
use tracing::debug;

use crate::games::{PlayerSlot, rhythm::Judgment, stroop::StroopCard};

/// Named sound effects a minigame can request.
///
/// Which cue fires on which transition is part of the game contract; timbre
/// and duration belong to the frontend synthesizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// Soft blip, used for fakeout call-outs and mid-tier feedback.
    Tone,
    /// Sharp bang announcing a genuine go-signal.
    Impact,
    /// Ascending arpeggio for a won round or game.
    Success,
    /// Descending buzz for fouls, wrong answers, and missed beats.
    Failure,
    /// Short click acknowledging a correct selection.
    Click,
}

impl Cue {
    /// Stable identifier used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Cue::Tone => "tone",
            Cue::Impact => "impact",
            Cue::Success => "success",
            Cue::Failure => "failure",
            Cue::Click => "click",
        }
    }
}

/// Rendered-state delta pushed from a minigame instance to the player zones.
///
/// The instance's internal state remains the single source of truth; these
/// values are one-way render signals carrying no authority.
#[derive(Clone, Debug)]
pub enum GameUpdate {
    /// Replace the message line of one zone, or of both when `slot` is `None`.
    Message {
        /// Target zone, `None` for both.
        slot: Option<PlayerSlot>,
        /// Text to display; empty clears the line.
        text: String,
    },
    /// Show a call-out in the shared center display, or hide it with `None`.
    CenterCue {
        /// Call-out text.
        text: Option<String>,
    },
    /// Show a word/ink card in the center display.
    Card(StroopCard),
    /// Hide the card again.
    CardHidden,
    /// Both slots' current scores, slot one first.
    Scoreboard {
        /// Score per slot, indexed by [`PlayerSlot::index`].
        scores: [u32; 2],
    },
    /// A round just resolved in favor of `winner`; zones flag winner/loser.
    RoundOutcome {
        /// Slot that took the round.
        winner: PlayerSlot,
    },
    /// Clear winner/loser/frozen decorations on both zones.
    ZonesReset,
    /// Present a shared problem with its answer choices.
    Problem {
        /// Rendered problem text.
        text: String,
        /// Answer choices in presentation order.
        answers: Vec<i64>,
    },
    /// Toggle the penalty freeze decoration for one zone.
    Freeze {
        /// Affected zone.
        slot: PlayerSlot,
        /// Whether the zone is now frozen.
        frozen: bool,
    },
    /// Current oscillating beat-bar position, in `[0, 1]`.
    BeatTick {
        /// Bar position; `0.5` is the hit target.
        position: f64,
    },
    /// A rhythm tap was judged.
    Judgment {
        /// Tapping zone.
        slot: PlayerSlot,
        /// Accuracy tier.
        tier: Judgment,
    },
    /// Updated race progress for one slot.
    Progress {
        /// Advancing zone.
        slot: PlayerSlot,
        /// Accumulated progress, clamped at the goal.
        value: u32,
    },
    /// Terminal state reached; `winner` takes the game.
    GameOver {
        /// Overall winner.
        winner: PlayerSlot,
    },
    /// Request playback of a named sound cue.
    Cue(Cue),
}

/// Broadcast hub fanning rendered-state deltas out to every subscriber.
///
/// This is the "mount point" handed to minigame instances: the SSE layer
/// subscribes and serializes, tests subscribe and assert.
#[derive(Clone)]
pub struct UpdateHub {
    sender: broadcast::Sender<GameUpdate>,
}

impl UpdateHub {
    /// Construct a hub backed by a broadcast channel of the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber receiving subsequent updates.
    pub fn subscribe(&self) -> broadcast::Receiver<GameUpdate> {
        self.sender.subscribe()
    }

    /// Push an update to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, update: GameUpdate) {
        let _ = self.sender.send(update);
    }
}

/// Process-wide sound capability shared by every minigame instance.
///
/// Browsers refuse to start audio before a user gesture, so the player stays
/// inert until [`CuePlayer::enable`] has been called once; cues requested
/// before that are dropped silently.
pub struct CuePlayer {
    enabled: AtomicBool,
    hub: UpdateHub,
}

impl CuePlayer {
    /// Create a disabled player publishing onto `hub`.
    pub fn new(hub: UpdateHub) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            hub,
        }
    }

    /// Unlock playback. Idempotent.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Whether playback has been unlocked.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Request playback of `cue`, dropping it while the player is disabled.
    pub fn play(&self, cue: Cue) {
        if !self.is_enabled() {
            debug!(cue = cue.name(), "cue dropped: audio not enabled yet");
            return;
        }
        self.hub.broadcast(GameUpdate::Cue(cue));
    }
}

/// One-shot completion signal back to the host shell.
///
/// Fires at most once; an unattached handle (no host listening) makes every
/// fire a no-op instead of an error.
pub struct CompletionHandle {
    sender: Mutex<Option<oneshot::Sender<()>>>,
}

impl CompletionHandle {
    /// Handle wired to a host-side receiver.
    pub fn new(sender: oneshot::Sender<()>) -> Self {
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Handle with no listener; every fire is a no-op.
    pub fn unattached() -> Self {
        Self {
            sender: Mutex::new(None),
        }
    }

    /// Signal completion. Subsequent calls do nothing.
    pub fn fire(&self) {
        let mut slot = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = slot.take() {
            let _ = sender.send(());
        }
    }
}

/// Capability bundle handed to a minigame instance at construction:
/// a rendering surface, the shared cue player, and the completion signal.
pub struct GameHarness {
    updates: UpdateHub,
    cues: Arc<CuePlayer>,
    completion: CompletionHandle,
}

impl GameHarness {
    /// Bundle the three capabilities.
    pub fn new(updates: UpdateHub, cues: Arc<CuePlayer>, completion: CompletionHandle) -> Self {
        Self {
            updates,
            cues,
            completion,
        }
    }

    /// Push a rendered-state delta.
    pub fn update(&self, update: GameUpdate) {
        self.updates.broadcast(update);
    }

    /// Replace the message line of one zone.
    pub fn message(&self, slot: PlayerSlot, text: impl Into<String>) {
        self.update(GameUpdate::Message {
            slot: Some(slot),
            text: text.into(),
        });
    }

    /// Replace the message line of both zones.
    pub fn message_both(&self, text: impl Into<String>) {
        self.update(GameUpdate::Message {
            slot: None,
            text: text.into(),
        });
    }

    /// Request a sound cue, subject to the player being enabled.
    pub fn cue(&self, cue: Cue) {
        self.cues.play(cue);
    }

    /// Fire the completion signal back to the host (at most once).
    pub fn complete(&self) {
        self.completion.fire();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cue_player_is_inert_until_enabled() {
        let hub = UpdateHub::new(16);
        let player = CuePlayer::new(hub.clone());
        let mut receiver = hub.subscribe();

        player.play(Cue::Impact);
        assert!(receiver.try_recv().is_err());

        player.enable();
        player.enable();
        player.play(Cue::Impact);
        match receiver.try_recv() {
            Ok(GameUpdate::Cue(Cue::Impact)) => {}
            other => panic!("expected impact cue, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn completion_handle_fires_at_most_once() {
        let (tx, mut rx) = oneshot::channel();
        let handle = CompletionHandle::new(tx);

        handle.fire();
        handle.fire();

        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn unattached_completion_is_a_no_op() {
        let handle = CompletionHandle::unattached();
        handle.fire();
    }
}
