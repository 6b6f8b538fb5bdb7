//! Speech-to-speech session engine
//!
//! This module provides the `SessionEngine` that manages:
//! - Conversation generations (only the latest one is live)
//! - Signing and opening the service connection
//! - Streaming the input recording as audio chunks
//! - Dispatching recognition, translation and audio messages
//! - The callback contract exposed to the caller

mod callback;
mod config;
mod conversation;
mod engine;
mod events;
mod generation;
mod transcript;

pub use callback::StsCallback;
pub use config::{DecodeFailurePolicy, SessionConfig};
pub use engine::{SessionEngine, ARGUMENTS_NULL};
pub use events::{ChannelCallback, SessionEvent};
pub use generation::{Generation, SessionManager};
pub use transcript::TranscriptAccumulator;
