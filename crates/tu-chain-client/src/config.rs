//! # Chain Client Configuration
//!
//! Defaults target the public development cluster. Values can be loaded from
//! a TOML file and then overridden from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Commitment, Pubkey, MAX_SEED_LEN};

/// Program that owns the shared account on the development cluster.
pub const DEFAULT_PROGRAM_ID: &str = "EGWf3mBuwhvjmR134QfzKGMo8EgtsC4ieMP3D6mxWFXq";

/// Seed the deployed program signs the shared account with.
pub const DEFAULT_SEED: &str = "base_account22";

/// Public development cluster.
pub const DEFAULT_ENDPOINT: &str = "https://api.devnet.solana.com";

/// Chain client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Program owning the shared account.
    pub program_id: Pubkey,

    /// Seed for the shared account address.
    pub seed: String,

    /// JSON-RPC endpoint of the ledger network.
    pub endpoint: String,

    /// Commitment used for reads, preflight and confirmation.
    pub commitment: Commitment,

    /// Upper bound on a confirmation wait.
    pub confirm_timeout_ms: u64,

    /// Delay between signature status polls.
    pub poll_interval_ms: u64,

    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,

    /// Keypair file for the local wallet (command-line use only).
    pub keypair_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID.parse().unwrap_or_default(),
            seed: DEFAULT_SEED.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            commitment: Commitment::Processed,
            confirm_timeout_ms: 30_000,
            poll_interval_ms: 500,
            request_timeout_ms: 10_000,
            keypair_path: None,
        }
    }
}

impl ClientConfig {
    /// Create a config for testing (short waits, local endpoint).
    pub fn for_testing() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8899".to_string(),
            confirm_timeout_ms: 200,
            poll_interval_ms: 10,
            request_timeout_ms: 1_000,
            ..Self::default()
        }
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply `TU_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("TU_PROGRAM_ID") {
            self.program_id = value.parse().map_err(|e| ConfigError::InvalidValue {
                key: "program_id",
                message: format!("{e}"),
            })?;
        }
        if let Some(value) = lookup("TU_SEED") {
            self.seed = value;
        }
        if let Some(value) = lookup("TU_ENDPOINT") {
            self.endpoint = value;
        }
        if let Some(value) = lookup("TU_COMMITMENT") {
            self.commitment = value.parse().map_err(|message| ConfigError::InvalidValue {
                key: "commitment",
                message,
            })?;
        }
        if let Some(value) = lookup("TU_CONFIRM_TIMEOUT_MS") {
            self.confirm_timeout_ms = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "confirm_timeout_ms",
                message: format!("'{value}' is not a number of milliseconds"),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed.is_empty() || self.seed.len() > MAX_SEED_LEN {
            return Err(ConfigError::InvalidValue {
                key: "seed",
                message: format!("must be 1..={MAX_SEED_LEN} bytes"),
            });
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "endpoint",
                message: "cannot be empty".into(),
            });
        }
        if self.confirm_timeout_ms == 0 || self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "confirm_timeout_ms",
                message: "timeouts cannot be 0".into(),
            });
        }
        if self.poll_interval_ms > self.confirm_timeout_ms {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval_ms",
                message: "cannot exceed confirm_timeout_ms".into(),
            });
        }
        Ok(())
    }

    /// Confirmation wait bound.
    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    /// Status poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// HTTP request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {message}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        message: String,
    },
    /// TOML syntax or type error
    #[error("invalid config file: {0}")]
    Parse(String),
    /// A value is out of range
    #[error("invalid {key}: {message}")]
    InvalidValue {
        /// Offending key.
        key: &'static str,
        /// What is wrong with it.
        message: String,
    },
}
