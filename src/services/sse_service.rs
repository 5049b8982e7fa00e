use std::{convert::Infallible, time::Duration};

use async_stream::stream;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::{
    dto::sse::{Handshake, ServerEvent, from_update},
    games::harness::GameUpdate,
    state::SharedState,
};

/// Subscribe to both sources feeding the zone SSE stream: rendered-state
/// deltas from the live minigame and host-level events.
pub fn subscribe(
    state: &SharedState,
) -> (
    broadcast::Receiver<GameUpdate>,
    broadcast::Receiver<ServerEvent>,
) {
    (state.zones().subscribe(), state.events().subscribe())
}

/// Merge the two subscriptions into one SSE response, starting with a
/// handshake event and keeping the connection alive between updates.
pub fn to_sse_stream(
    mut zones: broadcast::Receiver<GameUpdate>,
    mut events: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = stream! {
        if let Ok(handshake) = ServerEvent::json(
            Some("handshake".to_string()),
            &Handshake {
                stream: "zones".to_string(),
                message: "zone stream connected".to_string(),
            },
        ) {
            yield Ok(to_event(handshake));
        }

        loop {
            let next = tokio::select! {
                update = zones.recv() => match update {
                    Ok(update) => from_update(&update),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        // Skip lagged messages but keep the stream alive.
                        warn!(skipped, "zone subscriber lagging; updates dropped");
                        None
                    }
                },
                event = events.recv() => match event {
                    Ok(event) => Some(event),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "host event subscriber lagging");
                        None
                    }
                },
            };

            if let Some(payload) = next {
                yield Ok(to_event(payload));
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
