//! Multi-layer perceptron classifier.
//!
//! Mirrors a feed-forward network with dense layers: hidden layers share one
//! activation, and the output layer is either a single logistic unit or a
//! two-unit softmax.

use serde::{Deserialize, Serialize};

use super::{scale_row, StandardScaler};
use crate::domain::ClassifierError;
use crate::ports::{sigmoid, ProbabilisticClassifier};

/// Hidden-layer activation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Logistic,
    Identity,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Self::Relu => x.max(0.0),
            Self::Tanh => x.tanh(),
            Self::Logistic => sigmoid(x),
            Self::Identity => x,
        }
    }
}

/// Fully connected layer. `weights[j]` holds the input weights of unit `j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
}

impl DenseLayer {
    fn input_width(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    fn forward(&self, input: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        if self.weights.len() != self.biases.len() {
            return Err(ClassifierError::Architecture(format!(
                "layer has {} weight rows but {} biases",
                self.weights.len(),
                self.biases.len()
            )));
        }

        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| {
                if row.len() != input.len() {
                    return Err(ClassifierError::DimensionMismatch {
                        expected: row.len(),
                        actual: input.len(),
                    });
                }
                Ok(bias + row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>())
            })
            .collect()
    }
}

/// Feed-forward neural network classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpClassifier {
    pub layers: Vec<DenseLayer>,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl MlpClassifier {
    fn distribution(&self, row: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        let (output, hidden) = self
            .layers
            .split_last()
            .ok_or_else(|| ClassifierError::Architecture("network has no layers".into()))?;

        let mut activations = scale_row(self.scaler.as_ref(), row)?;
        for layer in hidden {
            activations = layer
                .forward(&activations)?
                .into_iter()
                .map(|z| self.activation.apply(z))
                .collect();
        }

        let logits = output.forward(&activations)?;
        let probs = match logits.as_slice() {
            [z] => {
                let p = sigmoid(*z);
                vec![1.0 - p, p]
            }
            [a, b] => softmax2(*a, *b),
            other => {
                return Err(ClassifierError::Architecture(format!(
                    "output layer has {} units, expected 1 or 2",
                    other.len()
                )))
            }
        };

        if probs.iter().all(|p| p.is_finite()) {
            Ok(probs)
        } else {
            Err(ClassifierError::NonFinite)
        }
    }
}

fn softmax2(a: f64, b: f64) -> Vec<f64> {
    let m = a.max(b);
    let ea = (a - m).exp();
    let eb = (b - m).exp();
    let sum = ea + eb;
    vec![ea / sum, eb / sum]
}

impl ProbabilisticClassifier for MlpClassifier {
    fn n_features(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_width)
    }

    fn n_classes(&self) -> usize {
        // A single logistic output unit still yields two classes.
        match self.layers.last().map(|l| l.weights.len()) {
            Some(1) | Some(2) => 2,
            Some(n) => n,
            None => 0,
        }
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ClassifierError> {
        batch.iter().map(|row| self.distribution(row)).collect()
    }
}
