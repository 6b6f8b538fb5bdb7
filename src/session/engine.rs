use anyhow::{Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::callback::StsCallback;
use super::config::{DecodeFailurePolicy, SessionConfig};
use super::conversation::CallbackGate;
use super::generation::SessionManager;
use crate::audio::{AudioSink, ChunkSource, Transcoder, WavTranscoder};
use crate::error::{ErrorCode, StsError, StsResult};
use crate::protocol::{self, InboundMessage, OutboundMessage, Received, StsReceiver, StsSender};
use crate::signer::Signer;

/// Message reported when `start` is called with an empty language or input path
pub const ARGUMENTS_NULL: &str = "Arguments are null!";

/// Runs speech-to-speech conversations against the translation service
///
/// Only the most recently started conversation is live. Starting a new one
/// supersedes all earlier ones: they keep running until their next checkpoint,
/// then stop without invoking their callback again.
pub struct SessionEngine {
    config: Arc<SessionConfig>,
    signer: Arc<Signer>,
    manager: SessionManager,
    rng: Arc<Mutex<StdRng>>,
    transcoder: Arc<dyn Transcoder>,
    runtime: Handle,
}

impl SessionEngine {
    /// Create an engine bound to the current tokio runtime
    pub fn new(config: SessionConfig) -> Result<Self> {
        let runtime =
            Handle::try_current().context("SessionEngine must be created inside a tokio runtime")?;

        info!(
            "Session engine initialized: {} ({}Hz, {} byte chunks, seed {:?})",
            config.service_url, config.sample_rate, config.chunk_size, config.seed
        );

        Ok(Self {
            signer: Arc::new(Signer::new(
                config.service_url.as_str(),
                config.app_id.as_str(),
                config.app_secret.as_str(),
            )),
            manager: SessionManager::new(),
            rng: Arc::new(Mutex::new(config.seed.rng())),
            transcoder: Arc::new(WavTranscoder::new(config.sample_rate)),
            config: Arc::new(config),
            runtime,
        })
    }

    /// Replace the default WAV transcoder
    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Id of the live conversation; 0 before the first one starts
    pub fn current_generation(&self) -> u64 {
        self.manager.current()
    }

    /// Start a conversation and return without waiting for it
    ///
    /// With no callback this is a no-op. With an empty `from`, `to` or
    /// `input_path` the callback receives `on_error(30002, "Arguments are null!")`
    /// before this returns and nothing is started. Otherwise the new
    /// conversation supersedes every earlier one, `output_dir` is created if
    /// missing, and the returned handle completes when the conversation ends.
    pub fn start(
        &self,
        from: &str,
        to: &str,
        input_path: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        callback: Option<Arc<dyn StsCallback>>,
    ) -> Option<JoinHandle<()>> {
        let Some(callback) = callback else {
            debug!("start called without a callback, ignoring");
            return None;
        };

        let input_path = input_path.as_ref();
        if from.is_empty() || to.is_empty() || input_path.as_os_str().is_empty() {
            warn!(
                "Rejecting conversation: from={:?} to={:?} input={:?}",
                from, to, input_path
            );
            callback.on_error(ErrorCode::Local.as_i32(), ARGUMENTS_NULL);
            return None;
        }

        let generation = self.manager.begin();
        let output_dir = output_dir.as_ref();

        info!(
            "Starting conversation {}: {} -> {}, input {}",
            generation.id(),
            from,
            to,
            input_path.display()
        );

        if let Err(e) = fs::create_dir_all(output_dir) {
            warn!("Failed to create output directory {}: {}", output_dir.display(), e);
        }

        let conversation = Conversation {
            gate: Arc::new(CallbackGate::new(generation, callback)),
            from: from.to_string(),
            to: to.to_string(),
            input_path: input_path.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            config: Arc::clone(&self.config),
            signer: Arc::clone(&self.signer),
            rng: Arc::clone(&self.rng),
            transcoder: Arc::clone(&self.transcoder),
        };

        Some(self.runtime.spawn(conversation.run()))
    }
}

/// Everything one conversation task needs, moved into it at launch
struct Conversation {
    gate: Arc<CallbackGate>,
    from: String,
    to: String,
    input_path: PathBuf,
    output_dir: PathBuf,
    config: Arc<SessionConfig>,
    signer: Arc<Signer>,
    rng: Arc<Mutex<StdRng>>,
    transcoder: Arc<dyn Transcoder>,
}

impl Conversation {
    async fn run(self) {
        let id = self.gate.id();

        if !self.gate.is_current() {
            debug!("Conversation {} superseded before it started", id);
            return;
        }

        let raw_path = self
            .output_dir
            .join(format!("{}-{}.pcm", Utc::now().timestamp_millis(), id));
        let sink = match AudioSink::create(&raw_path) {
            Ok(sink) => sink,
            Err(e) => {
                error!("Conversation {}: cannot create {}: {}", id, raw_path.display(), e);
                self.gate.fail(ErrorCode::Local, e);
                return;
            }
        };

        let endpoint = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.signer
                .sign(&self.from, &self.to, self.config.sample_rate, &mut *rng)
        };
        let endpoint = match endpoint {
            Ok(endpoint) => endpoint,
            Err(e) => {
                error!("Conversation {}: {}", id, e);
                sink.discard();
                self.gate.fail(ErrorCode::Connection, e);
                return;
            }
        };

        let (sender, receiver) =
            match protocol::connect(&endpoint, self.config.connect_timeout).await {
                Ok(halves) => halves,
                Err(e) => {
                    warn!("Conversation {} failed to connect: {}", id, e);
                    sink.discard();
                    self.gate.fail(ErrorCode::Connection, e);
                    return;
                }
            };

        if !self.gate.is_current() {
            debug!("Conversation {} superseded while connecting", id);
            sink.discard();
            sender.close().await;
            return;
        }

        self.gate.open();

        let inbound = tokio::spawn(
            Inbound {
                gate: Arc::clone(&self.gate),
                sender: sender.clone(),
                receiver,
                sink: Some(sink),
                transcoder: Arc::clone(&self.transcoder),
                policy: self.config.decode_failure,
            }
            .run(),
        );

        match stream_audio(&self.gate, &sender, &self.input_path, self.config.chunk_size).await {
            Ok(Upload::Completed { chunks, bytes }) => {
                info!("Conversation {} sent {} chunks ({} bytes) and end of audio", id, chunks, bytes);
            }
            Ok(Upload::Stopped { chunks }) => {
                info!("Conversation {} stopped uploading after {} chunks", id, chunks);
                sender.close().await;
            }
            Err(e) => {
                error!("Conversation {} failed while sending audio: {}", id, e);
                self.gate.fail(ErrorCode::Local, &e);
                sender.close().await;
            }
        }

        if let Err(e) = inbound.await {
            error!("Inbound task of conversation {} panicked: {}", id, e);
        }

        info!("Conversation {} ended", id);
    }
}

enum Upload {
    Completed { chunks: usize, bytes: u64 },
    /// Superseded or terminated before the upload finished
    Stopped { chunks: usize },
}

/// Send the input file chunk by chunk, then the end-of-audio marker
async fn stream_audio(
    gate: &CallbackGate,
    sender: &StsSender,
    input: &Path,
    chunk_size: usize,
) -> StsResult<Upload> {
    let mut source = ChunkSource::open(input, chunk_size)?;

    while let Some(chunk) = source.next() {
        let chunk = chunk?;

        if !gate.is_live() {
            return Ok(Upload::Stopped {
                chunks: source.chunks_read() - 1,
            });
        }

        sender.send(&OutboundMessage::Audio(chunk)).await?;
        debug!("Conversation {} sent chunk {}", gate.id(), source.chunks_read());
    }

    if !gate.is_live() {
        return Ok(Upload::Stopped {
            chunks: source.chunks_read(),
        });
    }

    sender.send(&OutboundMessage::AudioEnd).await?;

    Ok(Upload::Completed {
        chunks: source.chunks_read(),
        bytes: source.bytes_read(),
    })
}

enum Flow {
    Continue,
    Stop,
}

/// Inbound half of a conversation: dispatches service messages
struct Inbound {
    gate: Arc<CallbackGate>,
    sender: StsSender,
    receiver: StsReceiver,
    sink: Option<AudioSink>,
    transcoder: Arc<dyn Transcoder>,
    policy: DecodeFailurePolicy,
}

impl Inbound {
    async fn run(mut self) {
        let id = self.gate.id();

        loop {
            let message = match self.receiver.recv().await {
                Received::Message(message) => message,
                Received::Closed(cause) => {
                    self.discard_sink();
                    if self.gate.fail(ErrorCode::Connection, &cause) {
                        warn!("Conversation {} lost its connection: {}", id, cause);
                    } else {
                        debug!("Conversation {} connection closed: {}", id, cause);
                    }
                    return;
                }
            };

            if !self.gate.is_live() {
                debug!("Conversation {} no longer live, dropping inbound message", id);
                self.discard_sink();
                self.sender.close().await;
                return;
            }

            let flow = match message {
                Ok(message) => self.dispatch(message).await,
                Err(e) => {
                    warn!(
                        "Conversation {} failed to decode message: {} (payload: {})",
                        id, e, e.payload
                    );
                    self.payload_failed(StsError::Decode(e))
                }
            };

            if let Flow::Stop = flow {
                self.sender.close().await;
                return;
            }
        }
    }

    async fn dispatch(&mut self, message: InboundMessage) -> Flow {
        let id = self.gate.id();

        match message {
            InboundMessage::Audio(bytes) => self.write_audio(&bytes),
            InboundMessage::AudioFlush => self.flush().await,
            InboundMessage::Origin { text, is_final } => {
                debug!("Conversation {} recognized (final={}): {}", id, is_final, text);
                self.gate.recognized(is_final, &text);
                Flow::Continue
            }
            InboundMessage::Translation { text, is_final } => {
                debug!("Conversation {} translated (final={}): {}", id, is_final, text);
                self.gate.translated(is_final, &text);
                Flow::Continue
            }
            other @ (InboundMessage::OriginEnd
            | InboundMessage::TranslationEnd
            | InboundMessage::AudioEnd) => {
                debug!("Conversation {} received {}", id, other.tag());
                Flow::Continue
            }
            InboundMessage::Unknown(tag) => {
                debug!("Conversation {} ignoring message type {:?}", id, tag);
                Flow::Continue
            }
        }
    }

    fn write_audio(&mut self, bytes: &[u8]) -> Flow {
        let Some(sink) = self.sink.as_mut() else {
            debug!(
                "Conversation {} has no audio output, dropping {} bytes",
                self.gate.id(),
                bytes.len()
            );
            return Flow::Continue;
        };

        match sink.write(bytes) {
            Ok(()) => Flow::Continue,
            Err(StsError::InvalidAudio) => {
                warn!("Conversation {} received an empty audio chunk", self.gate.id());
                self.gate.error(ErrorCode::Payload, StsError::InvalidAudio);
                Flow::Continue
            }
            Err(e) => self.payload_failed(e),
        }
    }

    async fn flush(&mut self) -> Flow {
        let id = self.gate.id();
        let Some(sink) = self.sink.take() else {
            warn!("Conversation {} received a flush without audio output, ignoring", id);
            return Flow::Continue;
        };

        // Transcoding reads and rewrites the whole file
        let transcoder = Arc::clone(&self.transcoder);
        let flushed = tokio::task::spawn_blocking(move || sink.flush(transcoder.as_ref()))
            .await
            .unwrap_or_else(|e| Err(StsError::Closed(format!("transcode task failed: {}", e))));

        match flushed {
            Ok(path) => {
                if self.gate.finish(&path) {
                    info!("Conversation {} finished: {}", id, path.display());
                } else {
                    // Nobody will ever be told about this file
                    remove_orphan(&path);
                }
            }
            Err(e) => {
                error!("Conversation {} failed to finalize audio: {}", id, e);
                self.gate.fail(ErrorCode::Payload, e);
            }
        }

        Flow::Stop
    }

    /// Output audio is unusable: delete it and report per the decode failure policy
    fn payload_failed(&mut self, cause: StsError) -> Flow {
        self.discard_sink();

        match self.policy {
            DecodeFailurePolicy::Close => {
                self.gate.fail(ErrorCode::Payload, cause);
                Flow::Stop
            }
            DecodeFailurePolicy::Continue => {
                self.gate.error(ErrorCode::Payload, cause);
                Flow::Continue
            }
        }
    }

    fn discard_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            debug!(
                "Conversation {} discarding {} bytes of output audio",
                self.gate.id(),
                sink.bytes_written()
            );
            sink.discard();
        }
    }
}

fn remove_orphan(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}
