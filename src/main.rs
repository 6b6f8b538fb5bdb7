use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sts_client::{ChannelCallback, Config, SessionEngine, SessionEvent, TranscriptAccumulator};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "sts-client")]
#[command(about = "Translate a recorded PCM file through the speech-to-speech service")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/sts-client")]
    config: String,

    /// Source language code
    #[arg(short, long)]
    from: String,

    /// Target language code
    #[arg(short, long)]
    to: String,

    /// Raw 16-bit mono PCM recording to upload
    #[arg(short, long)]
    input: PathBuf,

    /// Where the returned audio is written (overrides the config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let cfg = Config::load(&args.config)?;
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| cfg.audio.output_dir.clone());

    info!("Loaded config: {}", cfg.service.url);

    let engine = SessionEngine::new(cfg.session_config())?;
    let (callback, mut events) = ChannelCallback::new();

    let Some(conversation) = engine.start(
        &args.from,
        &args.to,
        &args.input,
        &output_dir,
        Some(Arc::new(callback)),
    ) else {
        // Argument errors are delivered synchronously
        if let Ok(SessionEvent::Error { code, message }) = events.try_recv() {
            bail!("error {}: {}", code, message);
        }
        bail!("conversation was not started");
    };

    let mut recognized = TranscriptAccumulator::new();
    let mut translated = TranscriptAccumulator::new();
    let mut finished = false;
    let mut last_error = None;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };

                match event {
                    SessionEvent::Opened => info!("Connection open, uploading {}", args.input.display()),
                    SessionEvent::Recognized { is_final, text } => {
                        recognized.apply(is_final, &text);
                        if is_final {
                            println!("Recognized: {}", recognized.committed());
                        }
                    }
                    SessionEvent::Translated { is_final, text } => {
                        translated.apply(is_final, &text);
                        if is_final {
                            println!("Translated: {}", translated.committed());
                        }
                    }
                    SessionEvent::Finished(path) => {
                        println!("Audio: {}", path.display());
                        finished = true;
                    }
                    SessionEvent::Error { code, message } => {
                        warn!("Error {}: {}", code, message);
                        last_error = Some((code, message));
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }
        }
    }

    if let Err(e) = conversation.await {
        warn!("Conversation task failed: {}", e);
    }

    match last_error {
        Some((code, message)) if !finished => bail!("error {}: {}", code, message),
        _ => Ok(()),
    }
}
