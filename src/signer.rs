//! Signed connection endpoints
//!
//! Every conversation connects to a freshly signed URL. The signature is the
//! lowercase hex SHA-256 of `appid + salt + time + secret`, and the salt is a
//! short random alphanumeric nonce drawn from a caller-controlled RNG.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{StsError, StsResult};

/// Length of the random salt sent with every signed endpoint
pub const SALT_LEN: usize = 10;

const SALT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// How the salt RNG is seeded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedStrategy {
    /// Seed from operating system entropy
    #[default]
    Entropy,
    /// Fixed seed, for reproducible salts in tests and replays
    Fixed(u64),
}

impl SeedStrategy {
    pub fn rng(self) -> StdRng {
        match self {
            SeedStrategy::Entropy => StdRng::from_entropy(),
            SeedStrategy::Fixed(seed) => StdRng::seed_from_u64(seed),
        }
    }
}

/// A signed, immutable connection target for one conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
    pub salt: String,
    pub timestamp: String,
    pub sign: String,
}

impl Endpoint {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Value of a query parameter, if present
    pub fn param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Builds signed endpoints for one application identity
#[derive(Debug, Clone)]
pub struct Signer {
    base_url: String,
    app_id: String,
    app_secret: String,
}

impl Signer {
    pub fn new(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    /// Sign a new endpoint with a fresh salt and the current epoch millis
    pub fn sign<R: Rng + ?Sized>(
        &self,
        from: &str,
        to: &str,
        sample_rate: u32,
        rng: &mut R,
    ) -> StsResult<Endpoint> {
        let salt = random_salt(rng, SALT_LEN);
        let timestamp = Utc::now().timestamp_millis().to_string();
        self.sign_with(from, to, sample_rate, salt, timestamp)
    }

    /// Sign with an explicit salt and timestamp
    pub fn sign_with(
        &self,
        from: &str,
        to: &str,
        sample_rate: u32,
        salt: String,
        timestamp: String,
    ) -> StsResult<Endpoint> {
        let base = strip_spaces(&self.base_url);
        let mut url = Url::parse(&base)
            .map_err(|e| StsError::Signing(format!("invalid service url {:?}: {}", base, e)))?;

        let sign = signature(&self.app_id, &salt, &timestamp, &self.app_secret);

        url.query_pairs_mut()
            .append_pair("appid", &strip_spaces(&self.app_id))
            .append_pair("salt", &salt)
            .append_pair("time", &timestamp)
            .append_pair("sign", &sign)
            .append_pair("from", &strip_spaces(from))
            .append_pair("to", &strip_spaces(to))
            .append_pair("audioRate", &sample_rate.to_string());

        Ok(Endpoint {
            url,
            salt,
            timestamp,
            sign,
        })
    }
}

/// Lowercase hex SHA-256 over `app_id + salt + timestamp + app_secret`
pub fn signature(app_id: &str, salt: &str, timestamp: &str, app_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(app_id.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(timestamp.as_bytes());
    hasher.update(app_secret.as_bytes());

    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Random string over `[a-zA-Z0-9]`
pub fn random_salt<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| SALT_ALPHABET[rng.gen_range(0..SALT_ALPHABET.len())] as char)
        .collect()
}

fn strip_spaces(value: &str) -> String {
    value.replace(' ', "")
}
