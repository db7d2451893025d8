//! Model validation: capability checks on decoded artifacts.

use std::sync::Arc;

use crate::domain::{InvalidModelError, FEATURE_NAMES, NUM_FEATURES};
use crate::ports::{LoadedObject, ProbabilisticClassifier};

/// Decides whether a decoded object can serve risk predictions.
///
/// Checks conformance to [`ProbabilisticClassifier`] plus the trained
/// schema: two classes, four inputs, and the canonical feature order when
/// the model records its feature names.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelValidator;

impl ModelValidator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// True exactly when [`accept`](Self::accept) would succeed.
    #[must_use]
    pub fn validate(&self, candidate: &LoadedObject) -> bool {
        match candidate {
            LoadedObject::Model(m) => m
                .as_classifier()
                .is_some_and(|c| Self::check_schema(c).is_ok()),
            _ => false,
        }
    }

    /// Convert a decoded object into a shareable classifier.
    ///
    /// # Errors
    /// Returns `InvalidModelError` describing the first failed check.
    pub fn accept(
        &self,
        candidate: LoadedObject,
    ) -> Result<Arc<dyn ProbabilisticClassifier>, InvalidModelError> {
        let model = match candidate {
            LoadedObject::Model(m) => m,
            other => return Err(InvalidModelError::NotAModel(other.describe())),
        };

        let kind = model.kind().to_string();
        let classifier = model
            .into_classifier()
            .ok_or(InvalidModelError::MissingCapability(kind))?;
        Self::check_schema(classifier.as_ref())?;
        Ok(classifier)
    }

    fn check_schema(classifier: &dyn ProbabilisticClassifier) -> Result<(), InvalidModelError> {
        if classifier.n_classes() != 2 {
            return Err(InvalidModelError::ClassCount(classifier.n_classes()));
        }
        if classifier.n_features() != NUM_FEATURES {
            return Err(InvalidModelError::FeatureCount {
                expected: NUM_FEATURES,
                found: classifier.n_features(),
            });
        }
        if let Some(names) = classifier.feature_names() {
            if names.iter().map(String::as_str).ne(FEATURE_NAMES) {
                return Err(InvalidModelError::FeatureOrder {
                    expected: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
                    found: names.to_vec(),
                });
            }
        }
        Ok(())
    }
}
