use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use super::codec::{self, DecodeError};
use super::messages::{InboundMessage, OutboundMessage};
use crate::error::{StsError, StsResult};
use crate::signer::Endpoint;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open a session connection to a signed endpoint
///
/// Without a timeout the handshake may wait indefinitely.
pub async fn connect(
    endpoint: &Endpoint,
    timeout: Option<Duration>,
) -> StsResult<(StsSender, StsReceiver)> {
    info!(
        "Connecting to {}://{}{}",
        endpoint.url().scheme(),
        endpoint.url().host_str().unwrap_or_default(),
        endpoint.url().path()
    );

    let handshake = connect_async(endpoint.as_str());
    let (ws_stream, _) = match timeout {
        Some(limit) => tokio::time::timeout(limit, handshake)
            .await
            .map_err(|_| StsError::Timeout(limit.as_millis()))??,
        None => handshake.await?,
    };

    info!("Connected to session endpoint");

    let (writer, reader) = ws_stream.split();
    Ok((
        StsSender {
            writer: Arc::new(Mutex::new(writer)),
        },
        StsReceiver { reader },
    ))
}

/// Outbound half of a session connection. Clones share the same socket.
#[derive(Clone)]
pub struct StsSender {
    writer: Arc<Mutex<SplitSink<WsStream, Message>>>,
}

impl StsSender {
    pub async fn send(&self, message: &OutboundMessage) -> StsResult<()> {
        let text = codec::encode(message);
        let mut writer = self.writer.lock().await;
        writer.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Send a close frame. Errors are ignored; the socket is going away either way.
    pub async fn close(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.close().await {
            debug!("Closing session connection: {}", e);
        }
    }
}

/// What the inbound half yields
#[derive(Debug)]
pub enum Received {
    Message(Result<InboundMessage, DecodeError>),
    /// The connection is gone; carries a human-readable cause
    Closed(String),
}

/// Inbound half of a session connection
pub struct StsReceiver {
    reader: SplitStream<WsStream>,
}

impl StsReceiver {
    /// Next decoded message, skipping control frames
    pub async fn recv(&mut self) -> Received {
        loop {
            let frame = match self.reader.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return Received::Closed(e.to_string()),
                None => return Received::Closed("connection closed without close frame".to_string()),
            };

            match frame {
                Message::Text(text) => return Received::Message(codec::decode(&text)),
                Message::Binary(bytes) => return Received::Message(codec::decode_bytes(&bytes)),
                Message::Close(Some(close)) => {
                    return Received::Closed(format!(
                        "connection closed by peer (code {}: {})",
                        u16::from(close.code),
                        close.reason
                    ))
                }
                Message::Close(None) => {
                    return Received::Closed("connection closed by peer".to_string())
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }
}
