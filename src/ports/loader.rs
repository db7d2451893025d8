//! Artifact loader port: Trait for decoding stored model artifacts.
//!
//! Each storage format gets one loader. Loaders only decode; deciding whether
//! the decoded object is a usable model is the validator's job.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::ModelFormat;
use crate::ports::ProbabilisticClassifier;

/// A decoded model object of some concrete kind.
pub trait ModelObject: Send + Sync + std::fmt::Debug {
    /// Short name of the concrete model kind (e.g. `logistic_regression`).
    fn kind(&self) -> &str;

    /// Borrow the probabilistic classification capability, if present.
    fn as_classifier(&self) -> Option<&dyn ProbabilisticClassifier>;

    /// Convert into a shareable classifier, if the capability is present.
    fn into_classifier(self: Box<Self>) -> Option<Arc<dyn ProbabilisticClassifier>>;
}

/// Whatever a loader decoded from an artifact file.
#[derive(Debug)]
pub enum LoadedObject {
    /// A bare model
    Model(Box<dyn ModelObject>),
    /// A keyed container that may hold the model under `"model"`
    Mapping(BTreeMap<String, LoadedObject>),
    /// A value of some other type, described by name
    Opaque(String),
}

impl LoadedObject {
    /// Short description of the decoded value, for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Model(m) => format!("model {}", m.kind()),
            Self::Mapping(_) => "a mapping".to_string(),
            Self::Opaque(kind) => kind.clone(),
        }
    }
}

/// Decodes raw artifact bytes of one storage format.
pub trait ArtifactLoader: Send + Sync {
    /// The format this loader understands.
    fn format(&self) -> ModelFormat;

    /// Decode an artifact.
    ///
    /// # Errors
    /// Returns a description of the decode failure.
    fn load(&self, bytes: &[u8]) -> Result<LoadedObject, String>;
}
