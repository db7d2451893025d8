//! Concrete model types that can be stored in an artifact.
//!
//! Parameters are exported by the training pipeline; nothing here fits a
//! model. Serialized as an externally tagged enum so both the binary and the
//! bundle formats can carry them, e.g. `{"logistic_regression": {...}}`.

mod logistic;
mod mlp;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ClassifierError;
use crate::ports::{ModelObject, ProbabilisticClassifier};

pub use logistic::LogisticRegression;
pub use mlp::{Activation, DenseLayer, MlpClassifier};

/// Per-feature standardization applied before the model: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Standardize one row. A zero scale is treated as 1 (constant feature).
    ///
    /// # Errors
    /// Returns `ClassifierError::DimensionMismatch` if widths disagree.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        if self.mean.len() != row.len() || self.scale.len() != row.len() {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.mean.len(),
                actual: row.len(),
            });
        }

        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

pub(crate) fn scale_row(
    scaler: Option<&StandardScaler>,
    row: &[f64],
) -> Result<Vec<f64>, ClassifierError> {
    match scaler {
        Some(s) => s.transform(row),
        None => Ok(row.to_vec()),
    }
}

/// Ordinary least squares regressor.
///
/// Decodable from an artifact but produces a real value, not class
/// probabilities, so it never passes validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Every model kind an artifact may contain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression(LogisticRegression),
    Mlp(MlpClassifier),
    LinearRegression(LinearRegression),
}

impl Estimator {
    /// Serialized tags, used by the bundle loader to spot estimator objects.
    pub const TAGS: [&'static str; 3] = ["logistic_regression", "mlp", "linear_regression"];
}

impl ModelObject for Estimator {
    fn kind(&self) -> &str {
        match self {
            Self::LogisticRegression(_) => Self::TAGS[0],
            Self::Mlp(_) => Self::TAGS[1],
            Self::LinearRegression(_) => Self::TAGS[2],
        }
    }

    fn as_classifier(&self) -> Option<&dyn ProbabilisticClassifier> {
        match self {
            Self::LogisticRegression(m) => Some(m),
            Self::Mlp(m) => Some(m),
            Self::LinearRegression(_) => None,
        }
    }

    fn into_classifier(self: Box<Self>) -> Option<Arc<dyn ProbabilisticClassifier>> {
        match *self {
            Self::LogisticRegression(m) => Some(Arc::new(m)),
            Self::Mlp(m) => Some(Arc::new(m)),
            Self::LinearRegression(_) => None,
        }
    }
}
