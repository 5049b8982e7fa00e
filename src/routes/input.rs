use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::game::{AnswerRequest, TapRequest, slot_from_number},
    error::AppError,
    games::PlayerInput,
    services::input_service,
    state::SharedState,
};

#[utoipa::path(
    post,
    path = "/input/tap",
    tag = "input",
    request_body = TapRequest,
    responses(
        (status = 200, description = "Tap delivered"),
        (status = 409, description = "No game is running")
    )
)]
/// Forward a zone tap into the live minigame.
pub async fn tap(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<TapRequest>>,
) -> Result<(), AppError> {
    let slot = slot_from_number(payload.slot)?;
    input_service::dispatch(&state, slot, PlayerInput::Tap).await?;
    Ok(())
}

#[utoipa::path(
    post,
    path = "/input/answer",
    tag = "input",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer delivered"),
        (status = 409, description = "No game is running")
    )
)]
/// Forward an answer selection into the live minigame.
pub async fn answer(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Result<(), AppError> {
    let slot = slot_from_number(payload.slot)?;
    input_service::dispatch(&state, slot, PlayerInput::Answer(payload.value)).await?;
    Ok(())
}

#[utoipa::path(
    post,
    path = "/audio/enable",
    tag = "input",
    responses((status = 200, description = "Audio cues unlocked"))
)]
/// Unlock sound cue playback after the first user gesture.
pub async fn enable_audio(State(state): State<SharedState>) {
    input_service::enable_audio(&state);
}

/// Configure the input routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/input/tap", post(tap))
        .route("/input/answer", post(answer))
        .route("/audio/enable", post(enable_audio))
}
