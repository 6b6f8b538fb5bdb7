use thiserror::Error;

use crate::audio::TranscodeError;
use crate::protocol::DecodeError;

/// Numeric error codes reported through `StsCallback::on_error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// Transport or connection failure
    Connection = 30001,
    /// Invalid arguments, or local I/O failure while sending
    Local = 30002,
    /// Malformed or invalid inbound payload
    Payload = 30003,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.as_i32()
    }
}

/// Errors raised inside a conversation before they are mapped to a callback code
#[derive(Debug, Error)]
pub enum StsError {
    #[error("failed to build signed endpoint: {0}")]
    Signing(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection timed out after {0} ms")]
    Timeout(u128),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error("Audio data invalid!")]
    InvalidAudio,

    #[error("{0}")]
    Closed(String),
}

pub type StsResult<T> = Result<T, StsError>;
