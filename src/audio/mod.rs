pub mod chunk;
pub mod sink;
pub mod transcode;

pub use chunk::{ChunkSource, DEFAULT_CHUNK_SIZE};
pub use sink::AudioSink;
pub use transcode::{TranscodeError, Transcoder, WavTranscoder};
