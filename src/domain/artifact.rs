//! Model artifact locations.
//!
//! An [`ArtifactLocation`] is the ordered list of places a trained model may
//! live, each tagged with the storage format used to decode it.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Storage format of a model artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// General-purpose binary object serialization (bincode)
    #[serde(alias = "bincode", alias = "pickle")]
    Binary,
    /// ML model bundle (JSON), optionally wrapping the model under `"model"`
    #[serde(alias = "json", alias = "joblib")]
    Bundle,
}

impl ModelFormat {
    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Bundle => "bundle",
        }
    }
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" | "bincode" | "pickle" => Ok(Self::Binary),
            "bundle" | "json" | "joblib" => Ok(Self::Bundle),
            other => Err(format!(
                "Unknown model format {other:?} (expected binary or bundle)"
            )),
        }
    }
}

/// One place a model may be loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCandidate {
    /// How to decode the file
    pub format: ModelFormat,

    /// Filesystem path of the artifact
    pub path: PathBuf,

    /// Expected SHA-256 of the file contents (lowercase hex), if pinned
    #[serde(default)]
    pub sha256: Option<String>,
}

impl ArtifactCandidate {
    /// Create an unpinned candidate.
    #[must_use]
    pub fn new(format: ModelFormat, path: impl Into<PathBuf>) -> Self {
        Self {
            format,
            path: path.into(),
            sha256: None,
        }
    }

    /// Pin the candidate to a content digest.
    #[must_use]
    pub fn with_sha256(mut self, digest: impl Into<String>) -> Self {
        self.sha256 = Some(digest.into().to_ascii_lowercase());
        self
    }

    /// Path of the artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Display for ArtifactCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.format, self.path.display())
    }
}

/// Parses `format:path`. Splits on the first `:` so drive letters survive.
impl FromStr for ArtifactCandidate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (format, path) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("Expected format:path, got {s:?}"))?;
        let path = path.trim();
        if path.is_empty() {
            return Err(format!("Empty path in candidate {s:?}"));
        }
        Ok(Self::new(format.parse()?, path))
    }
}

/// Ordered model candidates, highest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactLocation {
    candidates: Vec<ArtifactCandidate>,
}

impl ArtifactLocation {
    /// Create a location list from candidates in priority order.
    #[must_use]
    pub fn new(candidates: Vec<ArtifactCandidate>) -> Self {
        Self { candidates }
    }

    /// Candidates in priority order.
    #[must_use]
    pub fn candidates(&self) -> &[ArtifactCandidate] {
        &self.candidates
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

impl FromIterator<ArtifactCandidate> for ArtifactLocation {
    fn from_iter<T: IntoIterator<Item = ArtifactCandidate>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
