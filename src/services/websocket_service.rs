use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    dto::{
        game::slot_from_number,
        ws::{InputFeedback, PadAck, PadInboundMessage},
    },
    games::PlayerInput,
    services::input_service,
    state::{PadConnection, SharedState},
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Internal error type for pad input handling.
#[derive(Debug, Error)]
enum PadError {
    /// Writer channel closed - connection should be terminated immediately.
    #[error("connection closed")]
    ConnectionClosed,
}

/// Handle the full lifecycle for an individual pad WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("pad identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let hello = match PadInboundMessage::from_json_str(&initial_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse or validate pad message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let PadInboundMessage::Hello { pad: pad_id } = hello else {
        warn!("first message was not a hello");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    state.pads().insert(
        pad_id.clone(),
        PadConnection {
            id: pad_id.clone(),
            tx: outbound_tx.clone(),
        },
    );
    info!(id = %pad_id, "pad connected");

    if send_json(
        &outbound_tx,
        &PadAck {
            pad: pad_id.clone(),
            status: "ok".to_string(),
        },
    )
    .is_err()
    {
        info!(id = %pad_id, "connection closed during ack, terminating");
        state.pads().remove(&pad_id);
        finalize(writer_task, outbound_tx).await;
        return;
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match PadInboundMessage::from_json_str(&text) {
                Ok(PadInboundMessage::Tap { slot }) => {
                    if forward_input(&state, slot, PlayerInput::Tap, &outbound_tx)
                        .await
                        .is_err()
                    {
                        info!(id = %pad_id, "connection closed during tap handling, terminating");
                        break;
                    }
                }
                Ok(PadInboundMessage::Answer { slot, value }) => {
                    if forward_input(&state, slot, PlayerInput::Answer(value), &outbound_tx)
                        .await
                        .is_err()
                    {
                        info!(id = %pad_id, "connection closed during answer handling, terminating");
                        break;
                    }
                }
                Ok(PadInboundMessage::Hello { .. }) => {
                    warn!(id = %pad_id, "ignoring duplicate hello message");
                }
                Ok(PadInboundMessage::Unknown) => {
                    warn!(id = %pad_id, "ignoring unknown pad message");
                }
                Err(err) => {
                    warn!(id = %pad_id, error = %err, "failed to parse pad message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(id = %pad_id, "pad closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(id = %pad_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.pads().remove(&pad_id);
    info!(id = %pad_id, "pad disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Route a pad input into the live instance and acknowledge it either way.
///
/// A pad tap is also a user gesture, so it doubles as the audio unlock.
async fn forward_input(
    state: &SharedState,
    slot_number: u8,
    input: PlayerInput,
    tx: &mpsc::UnboundedSender<Message>,
) -> Result<(), PadError> {
    input_service::enable_audio(state);

    let outcome = match slot_from_number(slot_number) {
        Ok(slot) => input_service::dispatch(state, slot, input).await,
        Err(err) => Err(err),
    };

    let feedback = match outcome {
        Ok(()) => InputFeedback {
            accepted: true,
            reason: None,
        },
        Err(err) => InputFeedback {
            accepted: false,
            reason: Some(err.to_string()),
        },
    };
    send_json(tx, &feedback)
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failure is a permanent error (bug in code), logged and
/// swallowed; a closed writer channel is returned for the caller to handle.
fn send_json<T>(tx: &mpsc::UnboundedSender<Message>, value: &T) -> Result<(), PadError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize pad message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| PadError::ConnectionClosed)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
