//! Binary logistic regression.

use serde::{Deserialize, Serialize};

use super::{scale_row, StandardScaler};
use crate::domain::ClassifierError;
use crate::ports::{sigmoid, ProbabilisticClassifier};

/// Logistic regression: `p = sigmoid(w . x + b)` on optionally scaled input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LogisticRegression {
    /// Create an unscaled model without recorded feature names.
    #[must_use]
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            scaler: None,
            feature_names: None,
        }
    }

    fn positive_probability(&self, row: &[f64]) -> Result<f64, ClassifierError> {
        if row.len() != self.coefficients.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: row.len(),
            });
        }

        let x = scale_row(self.scaler.as_ref(), row)?;
        let logit: f64 = x.iter().zip(&self.coefficients).map(|(xi, wi)| xi * wi).sum();
        let p = sigmoid(logit + self.intercept);
        if p.is_finite() {
            Ok(p)
        } else {
            Err(ClassifierError::NonFinite)
        }
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ClassifierError> {
        batch
            .iter()
            .map(|row| {
                let p = self.positive_probability(row)?;
                Ok(vec![1.0 - p, p])
            })
            .collect()
    }
}
