//! Error types for model resolution and inference.

use std::time::Duration;

use super::{ArtifactCandidate, ModelFormat};

/// Error raised by a classifier while computing probabilities.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Inconsistent model architecture: {0}")]
    Architecture(String),

    #[error("Non-finite value in model output")]
    NonFinite,

    #[error("{0}")]
    Other(String),
}

/// A deserialized object is not usable for probabilistic inference.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidModelError {
    #[error("Artifact holds {0}, not a model")]
    NotAModel(String),

    #[error("Artifact is a mapping without a \"model\" entry (keys: {0:?})")]
    MissingModelKey(Vec<String>),

    #[error("Model {0} has no probabilistic classification capability")]
    MissingCapability(String),

    #[error("Model predicts {0} classes, expected 2")]
    ClassCount(usize),

    #[error("Model expects {found} features, schema has {expected}")]
    FeatureCount { expected: usize, found: usize },

    #[error("Model feature order {found:?} does not match schema {expected:?}")]
    FeatureOrder {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Why a single artifact candidate was skipped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CandidateFailureCause {
    #[error("file not found")]
    Missing,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("SHA-256 mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("no loader registered for format {0}")]
    UnsupportedFormat(ModelFormat),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("invalid model: {0}")]
    Invalid(#[from] InvalidModelError),
}

/// A candidate together with the reason it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    pub candidate: ArtifactCandidate,
    pub cause: CandidateFailureCause,
}

impl std::fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.candidate, self.cause)
    }
}

/// No candidate yielded a valid model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", describe_failures(.failures))]
pub struct ModelNotFoundError {
    /// One entry per candidate tried, in priority order
    pub failures: Vec<CandidateFailure>,
}

fn describe_failures(failures: &[CandidateFailure]) -> String {
    if failures.is_empty() {
        return "No valid model found: no model candidates configured".to_string();
    }
    let tried: Vec<String> = failures.iter().map(ToString::to_string).collect();
    format!(
        "No valid model found after trying {} candidate(s): {}",
        failures.len(),
        tried.join("; ")
    )
}

impl ModelNotFoundError {
    /// True if every candidate failed because its file was absent.
    #[must_use]
    pub fn all_missing(&self) -> bool {
        self.failures
            .iter()
            .all(|f| matches!(f.cause, CandidateFailureCause::Missing))
    }
}

/// A single inference request failed. The cached model stays valid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("Model rejected input: {0}")]
    Model(#[from] ClassifierError),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Model call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Inference worker terminated without a result")]
    WorkerLost,
}

impl PredictionError {
    /// Message suitable for showing to the person who submitted the request.
    #[must_use]
    pub fn user_message(&self) -> String {
        format!("Prediction failed: {self}. Please check inputs and retry.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_model_not_found_lists_candidates() {
        let err = ModelNotFoundError {
            failures: vec![
                CandidateFailure {
                    candidate: ArtifactCandidate::new(ModelFormat::Binary, "/m/a.bin"),
                    cause: CandidateFailureCause::Missing,
                },
                CandidateFailure {
                    candidate: ArtifactCandidate::new(ModelFormat::Bundle, "/m/b.json"),
                    cause: InvalidModelError::MissingCapability("linear_regression".into()).into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("binary:/m/a.bin (file not found)"));
        assert!(msg.contains("bundle:/m/b.json"));
        assert!(msg.contains("linear_regression"));
        assert!(!err.all_missing());
        assert_eq!(err.failures[0].candidate.path, PathBuf::from("/m/a.bin"));
    }

    #[test]
    fn test_empty_failures_message() {
        let err = ModelNotFoundError { failures: vec![] };
        assert!(err.to_string().contains("no model candidates configured"));
    }

    #[test]
    fn test_prediction_user_message() {
        let err = PredictionError::Timeout(Duration::from_millis(20));
        assert!(err.user_message().ends_with("check inputs and retry."));
    }
}
