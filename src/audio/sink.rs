use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::transcode::Transcoder;
use crate::error::{StsError, StsResult};

/// Accumulates audio returned by the service into a raw PCM file
///
/// The raw file never outlives the sink: it is removed after a successful
/// flush, on `discard`, and on drop.
pub struct AudioSink {
    raw_path: PathBuf,
    writer: Option<BufWriter<File>>,
    bytes_written: u64,
    chunks_written: usize,
}

impl AudioSink {
    pub fn create(path: impl AsRef<Path>) -> StsResult<Self> {
        let raw_path = path.as_ref().to_path_buf();
        let file = File::create(&raw_path)?;

        debug!("Created audio sink {}", raw_path.display());

        Ok(Self {
            raw_path,
            writer: Some(BufWriter::new(file)),
            bytes_written: 0,
            chunks_written: 0,
        })
    }

    pub fn raw_path(&self) -> &Path {
        &self.raw_path
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn chunks_written(&self) -> usize {
        self.chunks_written
    }

    /// Append one decoded audio chunk. Empty chunks are rejected, not written.
    pub fn write(&mut self, bytes: &[u8]) -> StsResult<()> {
        if bytes.is_empty() {
            return Err(StsError::InvalidAudio);
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| StsError::Closed("audio sink already closed".to_string()))?;
        writer.write_all(bytes)?;

        self.bytes_written += bytes.len() as u64;
        self.chunks_written += 1;
        Ok(())
    }

    /// Close the raw file, transcode it, delete it, and return the transcoded path
    pub fn flush(mut self, transcoder: &dyn Transcoder) -> StsResult<PathBuf> {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                self.remove_raw();
                return Err(e.into());
            }
        }

        let result = transcoder.convert(&self.raw_path);
        self.remove_raw();

        let output = result?;
        info!(
            "Audio sink flushed: {} bytes in {} chunks -> {}",
            self.bytes_written,
            self.chunks_written,
            output.display()
        );
        Ok(output)
    }

    /// Drop everything written so far and delete the raw file
    pub fn discard(mut self) {
        self.writer.take();
        self.remove_raw();
    }

    fn remove_raw(&mut self) {
        if !self.raw_path.exists() {
            return;
        }

        match fs::remove_file(&self.raw_path) {
            Ok(()) => debug!("Removed raw audio {}", self.raw_path.display()),
            Err(e) => warn!("Failed to remove raw audio {}: {}", self.raw_path.display(), e),
        }
    }
}

impl Drop for AudioSink {
    fn drop(&mut self) {
        self.writer.take();
        self.remove_raw();
    }
}
