//! Runtime configuration for model resolution.
//!
//! The candidate list is deployment configuration, never hardcoded per site:
//!
//! - `SLNGUARD_CONFIG`: path to a JSON file (takes precedence)
//! - `SLNGUARD_MODEL_CANDIDATES`: `format:path` entries separated by `;` or
//!   newlines, highest priority first
//! - `SLNGUARD_INFERENCE_TIMEOUT_MS`: per-call model timeout
//!
//! Config file layout:
//!
//! ```json
//! {
//!   "candidates": [
//!     {"format": "binary", "path": "/srv/models/best_mlp_model.bin"},
//!     {"format": "bundle", "path": "/srv/models/nnet_style_model.json", "sha256": "9f86d0..."}
//!   ],
//!   "inference_timeout_ms": 5000
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::application::DEFAULT_INFERENCE_TIMEOUT;
use crate::domain::{ArtifactCandidate, ArtifactLocation, ModelFormat};

/// Environment variable naming a JSON config file.
pub const CONFIG_FILE_ENV: &str = "SLNGUARD_CONFIG";

/// Environment variable holding the candidate list.
pub const CANDIDATES_ENV: &str = "SLNGUARD_MODEL_CANDIDATES";

/// Environment variable overriding the inference timeout (milliseconds).
pub const TIMEOUT_ENV: &str = "SLNGUARD_INFERENCE_TIMEOUT_MS";

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model candidate: {0}")]
    Candidate(String),

    #[error("Invalid inference timeout {0:?} (expected milliseconds > 0)")]
    Timeout(String),
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    candidates: ArtifactLocation,
    #[serde(default)]
    inference_timeout_ms: Option<u64>,
}

/// Where to look for the model and how long a model call may take.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Candidates in priority order
    pub candidates: ArtifactLocation,

    /// Bound on a single model call
    pub inference_timeout: Duration,
}

impl ResolverConfig {
    /// Create a configuration with the default timeout.
    #[must_use]
    pub fn new(candidates: ArtifactLocation) -> Self {
        Self {
            candidates,
            inference_timeout: DEFAULT_INFERENCE_TIMEOUT,
        }
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set but malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = if let Some(path) = non_empty(CONFIG_FILE_ENV) {
            tracing::info!("Reading model configuration from {}", path.trim());
            Self::from_json_file(path.trim())?
        } else if let Some(list) = non_empty(CANDIDATES_ENV) {
            Self::new(Self::parse_candidates(&list)?)
        } else {
            tracing::warn!(
                "Neither {} nor {} set; using default model locations",
                CONFIG_FILE_ENV,
                CANDIDATES_ENV
            );
            Self::new(Self::default_candidates())
        };

        if let Some(raw) = non_empty(TIMEOUT_ENV) {
            config.inference_timeout = parse_timeout_ms(&raw)?;
        }

        Ok(config)
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from JSON text.
    ///
    /// # Errors
    /// Returns `ConfigError` on malformed JSON or a zero timeout.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(content)?;
        let mut config = Self::new(file.candidates);
        if let Some(ms) = file.inference_timeout_ms {
            if ms == 0 {
                return Err(ConfigError::Timeout(ms.to_string()));
            }
            config.inference_timeout = Duration::from_millis(ms);
        }
        Ok(config)
    }

    /// Parse a `format:path` list separated by `;` or newlines.
    ///
    /// # Errors
    /// Returns `ConfigError::Candidate` on the first malformed entry.
    pub fn parse_candidates(list: &str) -> Result<ArtifactLocation, ConfigError> {
        list.split(|c: char| c == ';' || c == '\n')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.parse::<ArtifactCandidate>().map_err(ConfigError::Candidate))
            .collect()
    }

    /// Locations tried when nothing is configured, relative to the working
    /// directory.
    #[must_use]
    pub fn default_candidates() -> ArtifactLocation {
        ArtifactLocation::new(vec![
            ArtifactCandidate::new(ModelFormat::Binary, "models/best_mlp_model.bin"),
            ArtifactCandidate::new(ModelFormat::Bundle, "models/best_mlp_model.json"),
            ArtifactCandidate::new(ModelFormat::Binary, "models/nnet_style_model.bin"),
        ])
    }
}

fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::Timeout(raw.to_string())),
    }
}
