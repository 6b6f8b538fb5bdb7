//! Stateless JSON codec for session messages

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::messages::{tags, AudioData, Envelope, InboundMessage, OutboundMessage, SentenceData};

/// An inbound payload that could not be decoded
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct DecodeError {
    pub reason: String,
    /// The payload as received
    pub payload: String,
}

impl DecodeError {
    fn new(reason: impl Into<String>, payload: &str) -> Self {
        Self {
            reason: reason.into(),
            payload: payload.to_string(),
        }
    }
}

pub fn encode(message: &OutboundMessage) -> String {
    let envelope = match message {
        OutboundMessage::Audio(bytes) => Envelope {
            kind: tags::AUDIO.to_string(),
            data: Some(AudioData {
                audio: BASE64.encode(bytes),
            }),
        },
        OutboundMessage::AudioEnd => Envelope {
            kind: tags::AUDIO_END.to_string(),
            data: None,
        },
    };

    // Strings and a map of strings always serialize
    serde_json::to_string(&envelope).unwrap_or_default()
}

pub fn decode(payload: &str) -> Result<InboundMessage, DecodeError> {
    let envelope: Envelope<Value> = serde_json::from_str(payload)
        .map_err(|e| DecodeError::new(format!("malformed message: {}", e), payload))?;

    let message = match envelope.kind.as_str() {
        tags::AUDIO => {
            let data: AudioData = data_of(envelope.data, payload)?;
            let bytes = BASE64
                .decode(data.audio.as_bytes())
                .map_err(|e| DecodeError::new(format!("invalid audio base64: {}", e), payload))?;
            InboundMessage::Audio(bytes)
        }
        tags::AUDIO_FLUSH => InboundMessage::AudioFlush,
        tags::AUDIO_END => InboundMessage::AudioEnd,
        tags::ORIGIN => {
            let data: SentenceData = data_of(envelope.data, payload)?;
            InboundMessage::Origin {
                text: data.sentence,
                is_final: data.is_final,
            }
        }
        tags::ORIGIN_END => InboundMessage::OriginEnd,
        tags::TRANSLATION => {
            let data: SentenceData = data_of(envelope.data, payload)?;
            InboundMessage::Translation {
                text: data.sentence,
                is_final: data.is_final,
            }
        }
        tags::TRANSLATION_END => InboundMessage::TranslationEnd,
        other => InboundMessage::Unknown(other.to_string()),
    };

    Ok(message)
}

/// Decode a binary frame carrying a UTF-8 JSON payload
pub fn decode_bytes(payload: &[u8]) -> Result<InboundMessage, DecodeError> {
    match std::str::from_utf8(payload) {
        Ok(text) => decode(text),
        Err(e) => Err(DecodeError::new(
            format!("payload is not UTF-8: {}", e),
            &String::from_utf8_lossy(payload),
        )),
    }
}

fn data_of<D: DeserializeOwned>(data: Option<Value>, payload: &str) -> Result<D, DecodeError> {
    let data = data.ok_or_else(|| DecodeError::new("missing data field", payload))?;
    serde_json::from_value(data)
        .map_err(|e| DecodeError::new(format!("malformed data field: {}", e), payload))
}
