// Loopback WebSocket server that plays the translation service in tests
//
// For each accepted connection the server records every client message until
// `audio/end` (or until the client goes away), optionally waits for a release
// signal, replays a scripted list of messages, and closes.

#![allow(dead_code)]

use anyhow::Result;
use base64::Engine;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use sts_client::{DecodeFailurePolicy, SeedStrategy, SessionConfig, SessionEvent};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// What the server saw from the client
#[derive(Debug, Default)]
pub struct Recorded {
    pub request_uri: String,
    pub messages: Vec<Value>,
}

impl Recorded {
    /// Decoded payloads of the recorded `audio` messages, in order
    pub fn audio_chunks(&self) -> Vec<Vec<u8>> {
        self.messages
            .iter()
            .filter(|m| m["type"] == "audio")
            .filter_map(|m| m["data"]["audio"].as_str())
            .filter_map(|a| base64::engine::general_purpose::STANDARD.decode(a).ok())
            .collect()
    }

    pub fn end_markers(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m["type"] == "audio/end")
            .count()
    }
}

pub struct ScriptedServer {
    pub url: String,
    pub handle: JoinHandle<Result<Vec<Recorded>>>,
}

/// Script for one accepted connection, optionally held back until `release` fires
pub type Conversation = (Vec<String>, Option<oneshot::Receiver<()>>);

impl ScriptedServer {
    pub async fn spawn(script: Vec<String>) -> Result<Self> {
        Self::spawn_many(vec![(script, None)]).await
    }

    /// Like `spawn`, but the script is held back until `release` fires
    pub async fn spawn_gated(
        script: Vec<String>,
        release: Option<oneshot::Receiver<()>>,
    ) -> Result<Self> {
        Self::spawn_many(vec![(script, release)]).await
    }

    /// Accept one connection per entry, in order, each served concurrently
    pub async fn spawn_many(conversations: Vec<Conversation>) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("ws://{}/v1/sts", listener.local_addr()?);

        let handle = tokio::spawn(async move {
            let mut served = Vec::new();
            for (script, release) in conversations {
                let (stream, _) = listener.accept().await?;
                served.push(tokio::spawn(serve(stream, script, release)));
            }

            let mut recorded = Vec::new();
            for handle in served {
                recorded.push(handle.await??);
            }
            Ok(recorded)
        });

        Ok(Self { url, handle })
    }

    /// Wait for the single connection to finish
    pub async fn finish(self) -> Result<Recorded> {
        self.finish_all()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("server accepted no connection"))
    }

    pub async fn finish_all(self) -> Result<Vec<Recorded>> {
        tokio::time::timeout(TIMEOUT, self.handle).await??
    }
}

async fn serve(
    stream: TcpStream,
    script: Vec<String>,
    release: Option<oneshot::Receiver<()>>,
) -> Result<Recorded> {
    let mut recorded = Recorded::default();
    let request_uri = &mut recorded.request_uri;
    let mut ws = tokio_tungstenite::accept_hdr_async(
        stream,
        |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            *request_uri = req.uri().to_string();
            Ok(resp)
        },
    )
    .await?;

    while let Some(Ok(frame)) = ws.next().await {
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let value: Value = serde_json::from_str(&text)?;
        let is_end = value["type"] == "audio/end";
        recorded.messages.push(value);
        if is_end {
            break;
        }
    }

    if let Some(release) = release {
        let _ = release.await;
    }

    for message in script {
        if ws.send(Message::Text(message)).await.is_err() {
            break;
        }
    }

    let _ = ws.close(None).await;
    while let Some(Ok(_)) = ws.next().await {}

    Ok(recorded)
}

pub fn session_config(url: &str) -> SessionConfig {
    SessionConfig {
        service_url: url.to_string(),
        app_id: "test-app".to_string(),
        app_secret: "test-secret".to_string(),
        sample_rate: 16000,
        chunk_size: 1000,
        seed: SeedStrategy::Fixed(40),
        decode_failure: DecodeFailurePolicy::Continue,
        connect_timeout: Some(Duration::from_secs(5)),
    }
}

pub fn audio(bytes: &[u8]) -> String {
    json!({
        "type": "audio",
        "data": { "audio": base64::engine::general_purpose::STANDARD.encode(bytes) }
    })
    .to_string()
}

pub fn origin(text: &str, is_final: bool) -> String {
    json!({ "type": "origin", "data": { "sentence": text, "is-final": is_final } }).to_string()
}

pub fn translation(text: &str, is_final: bool) -> String {
    json!({ "type": "translation", "data": { "sentence": text, "is-final": is_final } }).to_string()
}

pub fn marker(tag: &str) -> String {
    json!({ "type": tag }).to_string()
}

/// Wait for the conversation to end, then drain every event it produced
pub async fn collect_events(
    handle: JoinHandle<()>,
    mut rx: mpsc::UnboundedReceiver<SessionEvent>,
) -> Result<Vec<SessionEvent>> {
    tokio::time::timeout(TIMEOUT, handle).await??;

    let mut events = Vec::new();
    while let Some(event) = tokio::time::timeout(TIMEOUT, rx.recv()).await? {
        events.push(event);
    }
    Ok(events)
}

pub fn write_input(dir: &Path, len: usize) -> Result<std::path::PathBuf> {
    let bytes: Vec<u8> = (0..len).map(|i| (i % 253) as u8).collect();
    let path = dir.join("input.pcm");
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Files left in a directory, by name
pub fn files_in(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
