//! Model resolution: find, decode and validate the trained model once.
//!
//! Candidates are tried strictly in priority order. The first one that
//! decodes and validates is cached for the lifetime of the resolver; if none
//! does, the aggregated failure is cached instead and returned on every later
//! call until [`ModelResolver::re_resolve`] is invoked explicitly.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use sha2::{Digest, Sha256};

use crate::adapters;
use crate::application::ModelValidator;
use crate::domain::{
    ArtifactCandidate, ArtifactLocation, CandidateFailure, CandidateFailureCause,
    InvalidModelError, ModelNotFoundError,
};
use crate::ports::{ArtifactLoader, LoadedObject, ProbabilisticClassifier};

/// Key a container uses to hold the model.
const MODEL_KEY: &str = "model";

/// Lifecycle of the model cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    /// Nothing attempted yet
    Uninitialized,
    /// A resolution is in flight
    Resolving,
    /// A model is cached and serving
    Ready,
    /// Every candidate failed; no request can be served
    Failed,
}

impl ResolverState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Resolving,
            2 => Self::Ready,
            3 => Self::Failed,
            _ => Self::Uninitialized,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Resolving => 1,
            Self::Ready => 2,
            Self::Failed => 3,
        }
    }
}

/// Shared handle to a validated probabilistic classifier.
///
/// Cloning is cheap; all clones refer to the same model instance.
#[derive(Clone)]
pub struct ResolvedModel {
    classifier: Arc<dyn ProbabilisticClassifier>,
    source: Option<ArtifactCandidate>,
}

impl ResolvedModel {
    /// Wrap a classifier loaded from `source`.
    #[must_use]
    pub fn new(classifier: Arc<dyn ProbabilisticClassifier>, source: ArtifactCandidate) -> Self {
        Self {
            classifier,
            source: Some(source),
        }
    }

    /// Wrap a classifier constructed in-process rather than loaded.
    #[must_use]
    pub fn from_classifier(classifier: Arc<dyn ProbabilisticClassifier>) -> Self {
        Self {
            classifier,
            source: None,
        }
    }

    #[must_use]
    pub fn classifier(&self) -> &Arc<dyn ProbabilisticClassifier> {
        &self.classifier
    }

    /// The candidate this model was loaded from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&ArtifactCandidate> {
        self.source.as_ref()
    }

    /// True if both handles refer to the same model instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.classifier, &other.classifier)
    }
}

impl std::fmt::Debug for ResolvedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedModel")
            .field("source", &self.source.as_ref().map(ToString::to_string))
            .field("n_features", &self.classifier.n_features())
            .finish()
    }
}

/// Locates, decodes and validates the model artifact, caching the outcome.
pub struct ModelResolver {
    location: ArtifactLocation,
    loaders: Vec<Arc<dyn ArtifactLoader>>,
    validator: ModelValidator,
    cache: OnceLock<Result<ResolvedModel, ModelNotFoundError>>,
    state: AtomicU8,
}

impl ModelResolver {
    /// Create a resolver using the built-in binary and bundle loaders.
    #[must_use]
    pub fn new(location: ArtifactLocation) -> Self {
        Self::with_loaders(location, adapters::default_loaders())
    }

    /// Create a resolver with a custom set of format loaders.
    #[must_use]
    pub fn with_loaders(location: ArtifactLocation, loaders: Vec<Arc<dyn ArtifactLoader>>) -> Self {
        Self {
            location,
            loaders,
            validator: ModelValidator::new(),
            cache: OnceLock::new(),
            state: AtomicU8::new(ResolverState::Uninitialized.as_u8()),
        }
    }

    /// Candidates this resolver tries, in priority order.
    #[must_use]
    pub fn location(&self) -> &ArtifactLocation {
        &self.location
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ResolverState {
        ResolverState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ResolverState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// Return the cached model, resolving it on first use.
    ///
    /// Concurrent first callers block until the single in-flight resolution
    /// finishes and then all observe the same instance. A cached failure is
    /// returned as-is; it is never retried implicitly.
    ///
    /// # Errors
    /// Returns `ModelNotFoundError` listing every candidate and its cause.
    pub fn resolve(&self) -> Result<ResolvedModel, ModelNotFoundError> {
        self.cache
            .get_or_init(|| {
                self.set_state(ResolverState::Resolving);
                let outcome = self.resolve_uncached();
                self.set_state(match outcome {
                    Ok(_) => ResolverState::Ready,
                    Err(_) => ResolverState::Failed,
                });
                outcome
            })
            .clone()
    }

    /// Drop the cached outcome and resolve again.
    ///
    /// # Errors
    /// Returns `ModelNotFoundError` if no candidate validates.
    pub fn re_resolve(&mut self) -> Result<ResolvedModel, ModelNotFoundError> {
        tracing::warn!("Explicit model re-resolution requested");
        self.cache = OnceLock::new();
        self.set_state(ResolverState::Uninitialized);
        self.resolve()
    }

    fn resolve_uncached(&self) -> Result<ResolvedModel, ModelNotFoundError> {
        tracing::info!(
            "Resolving model from {} candidate(s)...",
            self.location.len()
        );

        let mut failures = Vec::new();
        for candidate in self.location.candidates() {
            match self.try_candidate(candidate) {
                Ok(model) => {
                    tracing::info!("Loaded model from {}", candidate);
                    return Ok(model);
                }
                Err(cause) => {
                    tracing::warn!("Skipping model candidate {}: {}", candidate, cause);
                    failures.push(CandidateFailure {
                        candidate: candidate.clone(),
                        cause,
                    });
                }
            }
        }

        let err = ModelNotFoundError { failures };
        tracing::error!("{}", err);
        Err(err)
    }

    fn try_candidate(
        &self,
        candidate: &ArtifactCandidate,
    ) -> Result<ResolvedModel, CandidateFailureCause> {
        let loader = self
            .loaders
            .iter()
            .find(|l| l.format() == candidate.format)
            .ok_or(CandidateFailureCause::UnsupportedFormat(candidate.format))?;

        let bytes = std::fs::read(candidate.path()).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CandidateFailureCause::Missing,
            _ => CandidateFailureCause::Io(e.to_string()),
        })?;

        if let Some(expected) = &candidate.sha256 {
            let actual = sha256_hex(&bytes);
            if !expected.eq_ignore_ascii_case(&actual) {
                return Err(CandidateFailureCause::DigestMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        let decoded = loader.load(&bytes).map_err(CandidateFailureCause::Decode)?;
        let classifier = self.validator.accept(unwrap_container(decoded)?)?;

        Ok(ResolvedModel::new(classifier, candidate.clone()))
    }
}

/// Containers carry the model under `"model"`; bare objects pass through.
fn unwrap_container(object: LoadedObject) -> Result<LoadedObject, InvalidModelError> {
    match object {
        LoadedObject::Mapping(mut map) => match map.remove(MODEL_KEY) {
            Some(inner) => {
                tracing::debug!("Unwrapped model from container key {:?}", MODEL_KEY);
                Ok(inner)
            }
            None => Err(InvalidModelError::MissingModelKey(map.into_keys().collect())),
        },
        other => Ok(other),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
