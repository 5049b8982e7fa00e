use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/zones",
    tag = "sse",
    responses((status = 200, description = "Zone update stream", content_type = "text/event-stream", body = String))
)]
/// Stream rendered zone state and host events to connected frontends.
pub async fn zones_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (zones, events) = sse_service::subscribe(&state);
    info!("new zone SSE connection");
    sse_service::to_sse_stream(zones, events)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/zones", get(zones_stream))
}
