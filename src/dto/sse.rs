use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::common::{ZoneScores, mirrored},
    games::harness::GameUpdate,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE stream.
pub struct ServerEvent {
    /// SSE event name, when the payload is typed.
    pub event: Option<String>,
    /// Pre-serialized JSON data field.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from a raw data string.
    pub fn new<E>(event: E, data: String) -> Self
    where
        E: Into<Option<String>>,
    {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the stream (`zones`).
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the host mounts a new minigame instance.
pub struct GameLaunchedEvent {
    /// Unique identifier of the launch.
    pub id: Uuid,
    /// Variant identifier (menu slug).
    pub game: String,
    /// RFC 3339 timestamp of the launch.
    pub launched_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the live instance is torn down and the menu returns.
pub struct GameClosedEvent {
    /// Why the instance went away: `completed`, `quit`, or `replaced`.
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Message line update for one zone, or both when `slot` is absent.
pub struct ZoneMessageEvent {
    /// 1-based target slot; absent means both zones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<u8>,
    /// Text to display; empty clears the line.
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Center call-out display update; `text` absent hides it.
pub struct CenterCueEvent {
    /// Call-out text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// A word/ink card revealed in the center display.
pub struct CardEvent {
    /// The word printed on the card.
    pub word: String,
    /// Name of the ink color.
    pub ink: String,
    /// CSS hex of the ink color.
    pub hex: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Scoreboard update carrying both zones' mirrored views.
pub struct ScoreboardEvent {
    /// Per-zone `own`/`opponent` scores, slot one first.
    pub zones: [ZoneScores; 2],
}

#[derive(Debug, Serialize, ToSchema)]
/// A round resolved; zones decorate winner and loser.
pub struct RoundOutcomeEvent {
    /// 1-based slot that took the round.
    pub winner: u8,
}

#[derive(Debug, Serialize, ToSchema)]
/// Shared problem presented to both zones.
pub struct ProblemEvent {
    /// Rendered problem text.
    pub text: String,
    /// Answer choices in presentation order.
    pub answers: Vec<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Penalty freeze toggled for one zone.
pub struct FreezeEvent {
    /// 1-based affected slot.
    pub slot: u8,
    /// Whether the zone is now frozen.
    pub frozen: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Current oscillating beat-bar position.
pub struct BeatEvent {
    /// Bar position in `[0, 1]`; `0.5` is the hit target.
    pub position: f64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Accuracy judgment of a rhythm tap.
pub struct JudgmentEvent {
    /// 1-based tapping slot.
    pub slot: u8,
    /// `perfect`, `good`, or `miss`.
    pub tier: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Race progress update for one zone.
pub struct ProgressEvent {
    /// 1-based advancing slot.
    pub slot: u8,
    /// Accumulated progress, clamped at the goal.
    pub value: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Terminal state reached.
pub struct GameOverEvent {
    /// 1-based overall winner.
    pub winner: u8,
}

#[derive(Debug, Serialize, ToSchema)]
/// Request to play a named sound cue.
pub struct CueEvent {
    /// `tone`, `impact`, `success`, `failure`, or `click`.
    pub cue: String,
}

/// Serialize a zone update into its SSE representation.
///
/// Returns `None` only if serialization fails, which would be a bug in the
/// payload types rather than a runtime condition worth propagating.
pub fn from_update(update: &GameUpdate) -> Option<ServerEvent> {
    let event = match update {
        GameUpdate::Message { slot, text } => ServerEvent::json(
            Some("zone_message".to_string()),
            &ZoneMessageEvent {
                slot: slot.map(|s| s.number()),
                text: text.clone(),
            },
        ),
        GameUpdate::CenterCue { text } => ServerEvent::json(
            Some("center_cue".to_string()),
            &CenterCueEvent { text: text.clone() },
        ),
        GameUpdate::Card(card) => ServerEvent::json(
            Some("card".to_string()),
            &CardEvent {
                word: card.word.word().to_string(),
                ink: card.ink.word().to_string(),
                hex: card.ink.hex().to_string(),
            },
        ),
        GameUpdate::CardHidden => Ok(ServerEvent::new(
            Some("card_hidden".to_string()),
            "{}".to_string(),
        )),
        GameUpdate::Scoreboard { scores } => ServerEvent::json(
            Some("scoreboard".to_string()),
            &ScoreboardEvent {
                zones: mirrored(*scores),
            },
        ),
        GameUpdate::RoundOutcome { winner } => ServerEvent::json(
            Some("round_outcome".to_string()),
            &RoundOutcomeEvent {
                winner: winner.number(),
            },
        ),
        GameUpdate::ZonesReset => Ok(ServerEvent::new(
            Some("zones_reset".to_string()),
            "{}".to_string(),
        )),
        GameUpdate::Problem { text, answers } => ServerEvent::json(
            Some("problem".to_string()),
            &ProblemEvent {
                text: text.clone(),
                answers: answers.clone(),
            },
        ),
        GameUpdate::Freeze { slot, frozen } => ServerEvent::json(
            Some("freeze".to_string()),
            &FreezeEvent {
                slot: slot.number(),
                frozen: *frozen,
            },
        ),
        GameUpdate::BeatTick { position } => ServerEvent::json(
            Some("beat".to_string()),
            &BeatEvent {
                position: *position,
            },
        ),
        GameUpdate::Judgment { slot, tier } => ServerEvent::json(
            Some("judgment".to_string()),
            &JudgmentEvent {
                slot: slot.number(),
                tier: tier.name().to_string(),
            },
        ),
        GameUpdate::Progress { slot, value } => ServerEvent::json(
            Some("progress".to_string()),
            &ProgressEvent {
                slot: slot.number(),
                value: *value,
            },
        ),
        GameUpdate::GameOver { winner } => ServerEvent::json(
            Some("game_over".to_string()),
            &GameOverEvent {
                winner: winner.number(),
            },
        ),
        GameUpdate::Cue(cue) => ServerEvent::json(
            Some("cue".to_string()),
            &CueEvent {
                cue: cue.name().to_string(),
            },
        ),
    };
    event.ok()
}
