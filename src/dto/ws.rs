use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::dto::validation::validate_pad_id;

/// Errors raised while decoding a pad message.
#[derive(Debug, Error)]
pub enum PadMessageError {
    /// The payload was not valid JSON for any known message.
    #[error("malformed pad message: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The hello message carried an unusable pad identifier.
    #[error("invalid pad id: {0}")]
    InvalidPadId(String),
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from pad WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PadInboundMessage {
    /// First message identifying the pad device.
    Hello {
        /// Pad identifier (lowercase alphanumeric and dashes).
        pad: String,
    },
    /// A plain tap in a player zone.
    Tap {
        /// 1-based player slot.
        slot: u8,
    },
    /// An answer selection in a player zone.
    Answer {
        /// 1-based player slot.
        slot: u8,
        /// Selected answer value.
        value: i64,
    },
    /// Forward-compatibility catch-all.
    #[serde(other)]
    Unknown,
}

impl PadInboundMessage {
    /// Parse and validate an incoming pad message.
    pub fn from_json_str(raw: &str) -> Result<Self, PadMessageError> {
        let message: Self = serde_json::from_str(raw)?;
        if let PadInboundMessage::Hello { pad } = &message {
            if let Err(err) = validate_pad_id(pad) {
                return Err(PadMessageError::InvalidPadId(err.to_string()));
            }
        }
        Ok(message)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Positive acknowledgement sent to a pad after successful identification.
pub struct PadAck {
    /// Echoed pad identifier.
    pub pad: String,
    /// Always `"ok"`.
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Feedback sent to a pad after it forwards an input event.
pub struct InputFeedback {
    /// Whether the event reached a live minigame instance.
    pub accepted: bool,
    /// Why it was dropped, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_three_known_messages() {
        let hello = PadInboundMessage::from_json_str(r#"{"type":"hello","pad":"table-1"}"#)
            .expect("hello parses");
        assert!(matches!(hello, PadInboundMessage::Hello { pad } if pad == "table-1"));

        let tap =
            PadInboundMessage::from_json_str(r#"{"type":"tap","slot":2}"#).expect("tap parses");
        assert!(matches!(tap, PadInboundMessage::Tap { slot: 2 }));

        let answer = PadInboundMessage::from_json_str(r#"{"type":"answer","slot":1,"value":12}"#)
            .expect("answer parses");
        assert!(matches!(
            answer,
            PadInboundMessage::Answer { slot: 1, value: 12 }
        ));
    }

    #[test]
    fn rejects_hello_with_a_bad_pad_id() {
        let err = PadInboundMessage::from_json_str(r#"{"type":"hello","pad":"NOT VALID"}"#)
            .expect_err("should reject");
        assert!(matches!(err, PadMessageError::InvalidPadId(_)));
    }

    #[test]
    fn unknown_message_types_fall_through() {
        let message = PadInboundMessage::from_json_str(r#"{"type":"mystery"}"#)
            .expect("unknown tolerated");
        assert!(matches!(message, PadInboundMessage::Unknown));
    }
}
