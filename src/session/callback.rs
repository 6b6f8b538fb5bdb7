use std::path::Path;

/// Receives the results of a speech-to-speech conversation
///
/// Methods are called from background tasks, never from the thread that
/// called `SessionEngine::start` (except the synchronous argument error).
/// `on_finish` and terminal errors are the last call a conversation makes.
///
/// Calls for one conversation are serialized, and its upload and inbound tasks
/// wait on them. Implementations must return quickly; hand slow work to a
/// channel or task (see `ChannelCallback`).
pub trait StsCallback: Send + Sync {
    /// Recognition text in the source language. Non-final results may be
    /// replaced by later ones for the same utterance.
    fn on_recognize_success(&self, is_final: bool, recognize_result: &str);

    /// Translation text in the target language, same finality rules as recognition
    fn on_translate_success(&self, is_final: bool, translate_result: &str);

    /// The returned audio has been written and transcoded to `voice_path`
    fn on_finish(&self, voice_path: &Path);

    /// The connection is open and input audio is about to be sent
    fn on_open(&self);

    /// `error_code` is one of the `ErrorCode` values
    fn on_error(&self, error_code: i32, error: &str);
}
