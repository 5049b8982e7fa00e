use serde::Serialize;
use utoipa::ToSchema;

/// Publicly visible host phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleHostPhase {
    /// No game mounted; the menu is showing.
    Menu,
    /// A minigame instance is live.
    Playing,
}
