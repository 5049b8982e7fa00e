use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, phase::VisibleHostPhase},
    error::ServiceError,
    games::{GameMeta, PlayerSlot},
    state::ActiveGame,
};

/// Menu entry describing one selectable minigame.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct GameDescriptor {
    /// Variant identifier used in launch routes.
    pub id: String,
    /// Display title.
    pub title: String,
    /// One-line pitch shown under the title.
    pub tagline: String,
}

impl GameDescriptor {
    /// Build a descriptor from the catalog metadata of `slug`.
    pub fn new(slug: &str, meta: &GameMeta) -> Self {
        Self {
            id: slug.to_string(),
            title: meta.title.to_string(),
            tagline: meta.tagline.to_string(),
        }
    }
}

/// Snapshot of the currently live minigame instance.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct GameSummary {
    /// Unique identifier of this launch.
    pub id: Uuid,
    /// Variant identifier (menu slug).
    pub game: String,
    /// Short label of the instance's current phase.
    pub phase: String,
    /// Scores (or race progress) per slot, slot one first.
    pub scores: [u32; 2],
    /// RFC 3339 timestamp of the launch.
    pub launched_at: String,
}

impl From<&ActiveGame> for GameSummary {
    fn from(game: &ActiveGame) -> Self {
        Self {
            id: game.id,
            game: game.kind.slug().to_string(),
            phase: game.instance.phase_label().to_string(),
            scores: game.instance.scores(),
            launched_at: format_system_time(game.launched_at),
        }
    }
}

/// Current host state: the menu, or a live game.
#[derive(Debug, Serialize, ToSchema)]
pub struct HostSnapshot {
    /// Menu or playing.
    pub phase: VisibleHostPhase,
    /// Present while a game is live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameSummary>,
}

/// A tap arriving from a player zone over REST.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TapRequest {
    /// 1-based player slot.
    #[validate(range(min = 1, max = 2))]
    pub slot: u8,
}

/// An answer selection arriving from a player zone over REST.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    /// 1-based player slot.
    #[validate(range(min = 1, max = 2))]
    pub slot: u8,
    /// Selected answer value.
    pub value: i64,
}

/// Convert a 1-based slot number from the wire into a [`PlayerSlot`].
pub fn slot_from_number(number: u8) -> Result<PlayerSlot, ServiceError> {
    PlayerSlot::from_number(number)
        .ok_or_else(|| ServiceError::InvalidInput(format!("invalid player slot `{number}`")))
}
