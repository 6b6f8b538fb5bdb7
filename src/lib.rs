pub mod audio;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod signer;

pub use audio::{AudioSink, ChunkSource, TranscodeError, Transcoder, WavTranscoder, DEFAULT_CHUNK_SIZE};
pub use config::Config;
pub use error::{ErrorCode, StsError, StsResult};
pub use protocol::{DecodeError, InboundMessage, OutboundMessage};
pub use session::{
    ChannelCallback, DecodeFailurePolicy, SessionConfig, SessionEngine, SessionEvent, StsCallback,
    TranscriptAccumulator, ARGUMENTS_NULL,
};
pub use signer::{Endpoint, SeedStrategy, Signer};
