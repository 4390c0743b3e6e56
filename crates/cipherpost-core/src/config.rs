//! Runtime configuration loaded from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use cipherpost_crypto::KdfParams;

use crate::defaults;
use crate::error::{Error, Result};

/// Configuration shared by the stores, the messenger and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessengerConfig {
    /// Root of the on-disk layout.
    pub data_dir: PathBuf,
    /// Argon2id parameters used when locking newly registered keys.
    pub kdf: KdfParams,
    /// Minimum passphrase length enforced at registration.
    pub min_passphrase_len: usize,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
            kdf: KdfParams::default(),
            min_passphrase_len: defaults::MIN_PASSPHRASE_LEN,
        }
    }
}

impl MessengerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CIPHERPOST_DATA_DIR` (default: `./cipherpost-data`)
    /// - `CIPHERPOST_KDF_MEMORY_KIB` (default: 65536)
    /// - `CIPHERPOST_KDF_ITERATIONS` (default: 3)
    /// - `CIPHERPOST_KDF_PARALLELISM` (default: 4)
    /// - `CIPHERPOST_MIN_PASSPHRASE_LEN` (default: 1)
    ///
    /// A variable that is set but does not parse is an error rather than a
    /// silent fallback to the default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup(defaults::ENV_DATA_DIR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(defaults::DATA_DIR));

        let kdf = KdfParams {
            memory_kib: parse_var(&lookup, defaults::ENV_KDF_MEMORY_KIB, defaults::KDF_MEMORY_KIB)?,
            iterations: parse_var(&lookup, defaults::ENV_KDF_ITERATIONS, defaults::KDF_ITERATIONS)?,
            parallelism: parse_var(
                &lookup,
                defaults::ENV_KDF_PARALLELISM,
                defaults::KDF_PARALLELISM,
            )?,
        };

        let min_passphrase_len = parse_var(
            &lookup,
            defaults::ENV_MIN_PASSPHRASE_LEN,
            defaults::MIN_PASSPHRASE_LEN,
        )?;

        let config = Self {
            data_dir,
            kdf,
            min_passphrase_len,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration rooted at `data_dir` with the given KDF parameters.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>, kdf: KdfParams) -> Self {
        Self {
            data_dir: data_dir.into(),
            kdf,
            min_passphrase_len: defaults::MIN_PASSPHRASE_LEN,
        }
    }

    /// Check the KDF parameters against Argon2's limits.
    pub fn validate(&self) -> Result<()> {
        self.kdf
            .validate()
            .map_err(|e| Error::Config(format!("invalid KDF parameters: {}", e)))
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got {:?}", name, raw))),
    }
}
