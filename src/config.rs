use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::DEFAULT_CHUNK_SIZE;
use crate::session::{DecodeFailurePolicy, SessionConfig};
use crate::signer::SeedStrategy;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub session: SessionSection,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub url: String,
    pub app_id: String,
    pub app_secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub chunk_size: usize,
    pub output_dir: PathBuf,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            chunk_size: DEFAULT_CHUNK_SIZE,
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Fixed salt RNG seed; OS entropy when absent
    pub seed: Option<u64>,
    pub decode_failure: DecodeFailurePolicy,
    pub connect_timeout_ms: Option<u64>,
}

impl Config {
    /// Load from a config file, with `STS_` environment variables layered on top
    /// (e.g. `STS_SERVICE__APP_SECRET`)
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("STS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            service_url: self.service.url.clone(),
            app_id: self.service.app_id.clone(),
            app_secret: self.service.app_secret.clone(),
            sample_rate: self.audio.sample_rate,
            chunk_size: self.audio.chunk_size,
            seed: self
                .session
                .seed
                .map(SeedStrategy::Fixed)
                .unwrap_or(SeedStrategy::Entropy),
            decode_failure: self.session.decode_failure,
            connect_timeout: self.session.connect_timeout_ms.map(Duration::from_millis),
        }
    }
}
