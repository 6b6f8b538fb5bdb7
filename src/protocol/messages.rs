use serde::{Deserialize, Serialize};

/// Messages sent to the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// One chunk of the input recording
    Audio(Vec<u8>),
    /// No more input audio will follow
    AudioEnd,
}

/// Messages received from the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Synthesized audio bytes
    Audio(Vec<u8>),
    /// End of the returned audio for this conversation
    AudioFlush,
    /// End of the audio stream (sent after the flush)
    AudioEnd,
    /// Recognition result in the source language
    Origin { text: String, is_final: bool },
    OriginEnd,
    /// Translation result in the target language
    Translation { text: String, is_final: bool },
    TranslationEnd,
    /// Any other tag; ignored by the session
    Unknown(String),
}

impl InboundMessage {
    pub fn tag(&self) -> &str {
        match self {
            InboundMessage::Audio(_) => tags::AUDIO,
            InboundMessage::AudioFlush => tags::AUDIO_FLUSH,
            InboundMessage::AudioEnd => tags::AUDIO_END,
            InboundMessage::Origin { .. } => tags::ORIGIN,
            InboundMessage::OriginEnd => tags::ORIGIN_END,
            InboundMessage::Translation { .. } => tags::TRANSLATION,
            InboundMessage::TranslationEnd => tags::TRANSLATION_END,
            InboundMessage::Unknown(tag) => tag,
        }
    }
}

/// Values of the `type` discriminator
pub mod tags {
    pub const AUDIO: &str = "audio";
    pub const AUDIO_END: &str = "audio/end";
    pub const AUDIO_FLUSH: &str = "audio/flush";
    pub const ORIGIN: &str = "origin";
    pub const ORIGIN_END: &str = "origin/end";
    pub const TRANSLATION: &str = "translation";
    pub const TRANSLATION_END: &str = "translation/end";
}

/// Wire envelope: `{ "type": ..., "data": ... }`
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope<D> {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<D>,
}

/// `data` of an audio message
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AudioData {
    pub audio: String, // Base64-encoded PCM bytes
}

/// `data` of a recognition or translation message
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SentenceData {
    pub sentence: String,
    #[serde(rename = "is-final")]
    pub is_final: bool,
}
