use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to read raw audio {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Wav {
        path: PathBuf,
        source: hound::Error,
    },
}

/// Converts a finished raw PCM file into its playable container format
pub trait Transcoder: Send + Sync {
    /// Convert `raw` and return the path of the produced file.
    ///
    /// Must not leave a partial output file behind on failure.
    fn convert(&self, raw: &Path) -> Result<PathBuf, TranscodeError>;
}

/// Wraps 16-bit little-endian PCM into a RIFF/WAV file next to the raw file
#[derive(Debug, Clone)]
pub struct WavTranscoder {
    pub sample_rate: u32,
    pub channels: u16,
}

impl WavTranscoder {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }

    fn write_wav(&self, raw: &Path, output: &Path) -> Result<u64, TranscodeError> {
        let read_err = |source| TranscodeError::Read {
            path: raw.to_path_buf(),
            source,
        };
        let wav_err = |source| TranscodeError::Wav {
            path: output.to_path_buf(),
            source,
        };

        let mut pcm = Vec::new();
        BufReader::new(File::open(raw).map_err(read_err)?)
            .read_to_end(&mut pcm)
            .map_err(read_err)?;

        if pcm.len() % 2 != 0 {
            warn!(
                "Raw audio {} has a trailing odd byte, dropping it",
                raw.display()
            );
        }

        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(output, spec).map_err(wav_err)?;
        let mut samples = 0u64;
        for pair in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(wav_err)?;
            samples += 1;
        }
        writer.finalize().map_err(wav_err)?;

        Ok(samples)
    }
}

impl Transcoder for WavTranscoder {
    fn convert(&self, raw: &Path) -> Result<PathBuf, TranscodeError> {
        let output = raw.with_extension("wav");

        match self.write_wav(raw, &output) {
            Ok(samples) => {
                info!(
                    "Transcoded {} -> {} ({} samples, {}Hz)",
                    raw.display(),
                    output.display(),
                    samples,
                    self.sample_rate
                );
                Ok(output)
            }
            Err(e) => {
                if output.exists() {
                    if let Err(rm) = fs::remove_file(&output) {
                        warn!("Failed to remove partial {}: {}", output.display(), rm);
                    }
                }
                Err(e)
            }
        }
    }
}
