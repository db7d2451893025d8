//! Classifier port: the probabilistic classification capability.
//!
//! A model is usable for risk prediction exactly when it implements this
//! trait. The concrete type behind it is irrelevant to the rest of the crate.

use crate::domain::ClassifierError;

/// A model that maps feature rows to class probability distributions.
///
/// # Concurrency
///
/// Implementations MUST NOT carry hidden mutable state: a resolved model is
/// shared behind an `Arc` and called concurrently through `&self` without
/// any locking.
pub trait ProbabilisticClassifier: Send + Sync + std::fmt::Debug {
    /// Number of input features per row.
    fn n_features(&self) -> usize;

    /// Number of classes in each output distribution.
    fn n_classes(&self) -> usize {
        2
    }

    /// Column names the model was trained on, if it recorded them.
    fn feature_names(&self) -> Option<&[String]> {
        None
    }

    /// Predict class probabilities for each row of `batch`.
    ///
    /// Returns one distribution per input row, classes in label order.
    ///
    /// # Errors
    /// Returns `ClassifierError` if a row has the wrong width or the model
    /// parameters are inconsistent.
    fn predict_proba(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ClassifierError>;

    /// Predict `(p_negative, p_positive)` for a single row.
    ///
    /// # Errors
    /// Returns `ClassifierError` if prediction fails or the model does not
    /// return exactly one two-class distribution.
    fn predict_probabilities(&self, features: &[f64]) -> Result<(f64, f64), ClassifierError> {
        let rows = self.predict_proba(&[features.to_vec()])?;
        match rows.as_slice() {
            [row] => match row.as_slice() {
                [neg, pos] => Ok((*neg, *pos)),
                other => Err(ClassifierError::Architecture(format!(
                    "expected 2 class probabilities, got {}",
                    other.len()
                ))),
            },
            other => Err(ClassifierError::Architecture(format!(
                "expected 1 output row, got {}",
                other.len()
            ))),
        }
    }
}

/// Logistic sigmoid.
#[must_use]
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
