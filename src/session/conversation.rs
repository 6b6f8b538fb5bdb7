use std::fmt::Display;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use super::callback::StsCallback;
use super::generation::Generation;
use crate::error::ErrorCode;

/// Guards one conversation's access to the caller's callback
///
/// A callback only fires while the conversation is still current and has not
/// delivered a terminal event. Invocations are serialized so a terminal event
/// can never be overtaken by a late non-terminal one. The latch is held while
/// the callback runs, so liveness probes wait on a slow callback.
pub(crate) struct CallbackGate {
    generation: Generation,
    callback: Arc<dyn StsCallback>,
    terminated: Mutex<bool>,
}

impl CallbackGate {
    pub fn new(generation: Generation, callback: Arc<dyn StsCallback>) -> Self {
        Self {
            generation,
            callback,
            terminated: Mutex::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.generation.id()
    }

    pub fn is_current(&self) -> bool {
        self.generation.is_current()
    }

    /// Current and not yet terminated
    pub fn is_live(&self) -> bool {
        self.is_current() && !*self.lock()
    }

    pub fn open(&self) {
        self.emit(false, |cb| cb.on_open());
    }

    pub fn recognized(&self, is_final: bool, text: &str) {
        self.emit(false, |cb| cb.on_recognize_success(is_final, text));
    }

    pub fn translated(&self, is_final: bool, text: &str) {
        self.emit(false, |cb| cb.on_translate_success(is_final, text));
    }

    /// Non-terminal error report
    pub fn error(&self, code: ErrorCode, message: impl Display) {
        let message = message.to_string();
        self.emit(false, |cb| cb.on_error(code.as_i32(), &message));
    }

    /// Terminal error report. Returns whether the callback fired.
    pub fn fail(&self, code: ErrorCode, message: impl Display) -> bool {
        let message = message.to_string();
        self.emit(true, |cb| cb.on_error(code.as_i32(), &message))
    }

    /// Terminal success. Returns whether the callback fired.
    pub fn finish(&self, path: &Path) -> bool {
        self.emit(true, |cb| cb.on_finish(path))
    }

    fn emit(&self, terminal: bool, call: impl FnOnce(&dyn StsCallback)) -> bool {
        let mut terminated = self.lock();

        if *terminated {
            debug!("Conversation {} already terminated, dropping callback", self.id());
            return false;
        }
        if !self.generation.is_current() {
            debug!("Conversation {} is stale, dropping callback", self.id());
            return false;
        }

        if terminal {
            *terminated = true;
        }
        call(self.callback.as_ref());
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, bool> {
        self.terminated.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
