use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::game::{GameDescriptor, GameSummary, HostSnapshot},
    error::AppError,
    services::host_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/games",
    tag = "menu",
    responses((status = 200, description = "Menu catalog", body = [GameDescriptor]))
)]
/// List the selectable minigames in menu order.
pub async fn list_games() -> Json<Vec<GameDescriptor>> {
    Json(host_service::list_games())
}

#[utoipa::path(
    post,
    path = "/games/{game}/launch",
    tag = "menu",
    params(("game" = String, Path, description = "Variant identifier to launch")),
    responses(
        (status = 200, description = "Game launched", body = GameSummary),
        (status = 404, description = "Unknown game identifier")
    )
)]
/// Mount and start a minigame, replacing any live instance.
pub async fn launch_game(
    State(state): State<SharedState>,
    Path(game): Path<String>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = host_service::launch(&state, &game).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    post,
    path = "/games/quit",
    tag = "menu",
    responses(
        (status = 200, description = "Back at the menu"),
        (status = 409, description = "No game is running")
    )
)]
/// Tear down the live instance and return to the menu.
pub async fn quit_game(State(state): State<SharedState>) -> Result<(), AppError> {
    host_service::quit(&state).await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/games/current",
    tag = "menu",
    responses((status = 200, description = "Current host state", body = HostSnapshot))
)]
/// Snapshot the host state: the menu, or the live game.
pub async fn current_game(State(state): State<SharedState>) -> Json<HostSnapshot> {
    Json(host_service::snapshot(&state).await)
}

/// Configure the menu routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/games", get(list_games))
        .route("/games/{game}/launch", post(launch_game))
        .route("/games/quit", post(quit_game))
        .route("/games/current", get(current_game))
}
