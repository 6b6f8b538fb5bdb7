use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::audio::DEFAULT_CHUNK_SIZE;
use crate::signer::SeedStrategy;

/// What a conversation does after an inbound message fails to decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeFailurePolicy {
    /// Report a terminal error and close the connection
    Close,
    /// Report the error, discard the output audio, and keep processing text results
    #[default]
    Continue,
}

/// Configuration shared by every conversation an engine starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base WebSocket URL of the translation service (query is added by the signer)
    pub service_url: String,

    /// Application identity used for signing
    pub app_id: String,
    pub app_secret: String,

    /// Sample rate of the input recording and of the returned audio
    pub sample_rate: u32,

    /// Bytes of input audio per outbound message
    pub chunk_size: usize,

    /// Seeding of the salt RNG
    pub seed: SeedStrategy,

    pub decode_failure: DecodeFailurePolicy,

    /// Handshake timeout; `None` waits indefinitely
    pub connect_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_url: "wss://localhost/v1/sts".to_string(),
            app_id: String::new(),
            app_secret: String::new(),
            sample_rate: 16000,
            chunk_size: DEFAULT_CHUNK_SIZE,
            seed: SeedStrategy::Entropy,
            decode_failure: DecodeFailurePolicy::Continue,
            connect_timeout: None,
        }
    }
}
