use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use super::callback::StsCallback;

/// A callback invocation, as a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened,
    Recognized { is_final: bool, text: String },
    Translated { is_final: bool, text: String },
    Finished(PathBuf),
    Error { code: i32, message: String },
}

/// `StsCallback` that forwards every invocation onto a channel, in call order
///
/// The receiver sees the channel close once every conversation holding the
/// callback has ended.
#[derive(Debug, Clone)]
pub struct ChannelCallback {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelCallback {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: SessionEvent) {
        // The receiver may have been dropped; events are then simply lost
        let _ = self.tx.send(event);
    }
}

impl StsCallback for ChannelCallback {
    fn on_recognize_success(&self, is_final: bool, recognize_result: &str) {
        self.emit(SessionEvent::Recognized {
            is_final,
            text: recognize_result.to_string(),
        });
    }

    fn on_translate_success(&self, is_final: bool, translate_result: &str) {
        self.emit(SessionEvent::Translated {
            is_final,
            text: translate_result.to_string(),
        });
    }

    fn on_finish(&self, voice_path: &Path) {
        self.emit(SessionEvent::Finished(voice_path.to_path_buf()));
    }

    fn on_open(&self) {
        self.emit(SessionEvent::Opened);
    }

    fn on_error(&self, error_code: i32, error: &str) {
        self.emit(SessionEvent::Error {
            code: error_code,
            message: error.to_string(),
        });
    }
}
