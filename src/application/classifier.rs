//! Risk classification: run the model and threshold its output.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::application::ResolvedModel;
use crate::domain::{FeatureVector, PredictionError, PredictionResult};

/// Default bound on a single model call.
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Tolerance on the sum of a class distribution.
const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// Index of the "metastasis present" class.
const POSITIVE_CLASS: usize = 1;

/// Turns a feature vector into a thresholded risk prediction.
#[derive(Debug, Clone, Copy)]
pub struct RiskClassifier {
    timeout: Duration,
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_INFERENCE_TIMEOUT)
    }
}

impl RiskClassifier {
    /// Create a classifier with the given per-call timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Predict the SLN metastasis risk for one vector.
    ///
    /// The model runs on a worker thread. If it does not answer within the
    /// timeout the call fails; the worker is left to finish and its result
    /// is dropped.
    ///
    /// # Errors
    /// Returns `PredictionError` if the model fails, times out, or returns
    /// anything other than one row of two probabilities.
    pub fn classify(
        &self,
        model: &ResolvedModel,
        vector: &FeatureVector,
    ) -> Result<PredictionResult, PredictionError> {
        let rows = self.call_with_timeout(model, vector.to_row())?;
        let probability = positive_probability(&rows)?;

        Ok(PredictionResult::new(probability, *vector.observation()))
    }

    fn call_with_timeout(
        &self,
        model: &ResolvedModel,
        row: Vec<f64>,
    ) -> Result<Vec<Vec<f64>>, PredictionError> {
        let classifier = model.classifier().clone();
        let (tx, rx) = mpsc::channel();

        thread::Builder::new()
            .name("sln-inference".to_string())
            .spawn(move || {
                let _ = tx.send(classifier.predict_proba(&[row]));
            })
            .map_err(|_| PredictionError::WorkerLost)?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => Ok(result?),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!("Model call exceeded {:?}, abandoning request", self.timeout);
                Err(PredictionError::Timeout(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(PredictionError::WorkerLost),
        }
    }
}

/// Extract the positive-class probability from a one-row batch output.
fn positive_probability(rows: &[Vec<f64>]) -> Result<f64, PredictionError> {
    let row = match rows {
        [row] => row,
        _ => {
            return Err(PredictionError::MalformedOutput(format!(
                "expected 1 row, got {}",
                rows.len()
            )))
        }
    };

    if row.len() != 2 {
        return Err(PredictionError::MalformedOutput(format!(
            "expected 2 class probabilities, got {}",
            row.len()
        )));
    }
    if row.iter().any(|p| !p.is_finite() || !(0.0..=1.0).contains(p)) {
        return Err(PredictionError::MalformedOutput(format!(
            "probabilities out of [0, 1]: {row:?}"
        )));
    }
    let total: f64 = row.iter().sum();
    if (total - 1.0).abs() > DISTRIBUTION_TOLERANCE {
        return Err(PredictionError::MalformedOutput(format!(
            "probabilities sum to {total}, expected 1"
        )));
    }

    Ok(row[POSITIVE_CLASS])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassifierError, ClinicalObservation, FeatureVectorBuilder, RiskLabel};
    use crate::ports::ProbabilisticClassifier;
    use std::sync::{Arc, Mutex};

    /// Returns a fixed output and records the rows it was called with.
    #[derive(Debug)]
    struct StubModel {
        output: Vec<Vec<f64>>,
        seen: Mutex<Vec<Vec<f64>>>,
    }

    impl StubModel {
        fn positive(p: f64) -> Self {
            Self::raw(vec![vec![1.0 - p, p]])
        }

        fn raw(output: Vec<Vec<f64>>) -> Self {
            Self {
                output,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ProbabilisticClassifier for StubModel {
        fn n_features(&self) -> usize {
            4
        }

        fn predict_proba(&self, batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ClassifierError> {
            self.seen.lock().expect("lock").extend(batch.iter().cloned());
            Ok(self.output.clone())
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl ProbabilisticClassifier for Failing {
        fn n_features(&self) -> usize {
            4
        }

        fn predict_proba(&self, _batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ClassifierError> {
            Err(ClassifierError::DimensionMismatch {
                expected: 5,
                actual: 4,
            })
        }
    }

    #[derive(Debug)]
    struct Slow(Duration);

    impl ProbabilisticClassifier for Slow {
        fn n_features(&self) -> usize {
            4
        }

        fn predict_proba(&self, _batch: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ClassifierError> {
            thread::sleep(self.0);
            Ok(vec![vec![0.5, 0.5]])
        }
    }

    fn scenario_vector() -> FeatureVector {
        FeatureVectorBuilder::new().build(&ClinicalObservation::new(false, 4.0, 0.0, false))
    }

    #[test]
    fn test_scenario_a_high() {
        let stub = Arc::new(StubModel::positive(0.73));
        let model = ResolvedModel::from_classifier(stub.clone());

        let result = RiskClassifier::default()
            .classify(&model, &scenario_vector())
            .expect("classify");

        assert!((result.probability - 0.73).abs() < 1e-12);
        assert_eq!(result.risk_label, RiskLabel::High);
        assert_eq!(result.inputs, ClinicalObservation::new(false, 4.0, 0.0, false));
        assert_eq!(*stub.seen.lock().expect("lock"), vec![vec![0.0, 4.0, 0.0, 0.0]]);
    }

    #[test]
    fn test_scenario_b_low() {
        let model = ResolvedModel::from_classifier(Arc::new(StubModel::positive(0.12)));
        let result = RiskClassifier::default()
            .classify(&model, &scenario_vector())
            .expect("classify");

        assert!((result.probability - 0.12).abs() < 1e-12);
        assert_eq!(result.risk_label, RiskLabel::Low);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let model = ResolvedModel::from_classifier(Arc::new(StubModel::raw(vec![vec![0.5, 0.5]])));
        let result = RiskClassifier::default()
            .classify(&model, &scenario_vector())
            .expect("classify");
        assert_eq!(result.probability, 0.5);
        assert_eq!(result.risk_label, RiskLabel::High);
    }

    #[test]
    fn test_deterministic() {
        let model = ResolvedModel::from_classifier(Arc::new(StubModel::positive(0.41)));
        let classifier = RiskClassifier::default();
        let a = classifier.classify(&model, &scenario_vector()).expect("classify");
        let b = classifier.classify(&model, &scenario_vector()).expect("classify");
        assert_eq!(a.probability, b.probability);
        assert_eq!(a.risk_label, b.risk_label);
    }

    #[test]
    fn test_malformed_shapes() {
        let cases = vec![
            vec![],
            vec![vec![0.3, 0.7], vec![0.3, 0.7]],
            vec![vec![0.7]],
            vec![vec![0.1, 0.2, 0.7]],
            vec![vec![-0.2, 1.2]],
            vec![vec![0.4, 0.4]],
            vec![vec![f64::NAN, 0.5]],
        ];
        for output in cases {
            let model = ResolvedModel::from_classifier(Arc::new(StubModel::raw(output.clone())));
            let err = RiskClassifier::default()
                .classify(&model, &scenario_vector())
                .expect_err("must fail");
            assert!(
                matches!(err, PredictionError::MalformedOutput(_)),
                "output {output:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_model_error_propagates() {
        let model = ResolvedModel::from_classifier(Arc::new(Failing));
        let err = RiskClassifier::default()
            .classify(&model, &scenario_vector())
            .expect_err("must fail");
        assert!(matches!(err, PredictionError::Model(_)));
    }

    #[test]
    fn test_timeout() {
        let model = ResolvedModel::from_classifier(Arc::new(Slow(Duration::from_millis(500))));
        let classifier = RiskClassifier::new(Duration::from_millis(20));
        let err = classifier
            .classify(&model, &scenario_vector())
            .expect_err("must time out");
        assert_eq!(err, PredictionError::Timeout(Duration::from_millis(20)));
    }
}
