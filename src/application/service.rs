//! Prediction service: Orchestrates model resolution and risk inference.
//!
//! This service coordinates:
//! - Eager model resolution at startup
//! - Feature encoding per request
//! - Thresholded classification

use std::sync::Arc;

use crate::application::{ModelResolver, ResolvedModel, ResolverState, RiskClassifier};
use crate::config::ResolverConfig;
use crate::domain::{
    ClinicalObservation, FeatureVectorBuilder, ModelNotFoundError, PredictionResult,
};
use crate::SlnError;

/// Service for SLN metastasis risk predictions.
///
/// Cheap to share: the resolver sits behind an `Arc` and the resolved model
/// is read-only, so `predict` may be called from many threads at once.
#[derive(Clone)]
pub struct PredictionService {
    resolver: Arc<ModelResolver>,
    builder: FeatureVectorBuilder,
    classifier: RiskClassifier,
}

impl PredictionService {
    /// Create a new prediction service.
    #[must_use]
    pub fn new(resolver: Arc<ModelResolver>, classifier: RiskClassifier) -> Self {
        Self {
            resolver,
            builder: FeatureVectorBuilder::new(),
            classifier,
        }
    }

    /// Build a service from runtime configuration.
    #[must_use]
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self::new(
            Arc::new(ModelResolver::new(config.candidates.clone())),
            RiskClassifier::new(config.inference_timeout),
        )
    }

    /// Resolve the model now instead of on the first request.
    ///
    /// # Errors
    /// Returns `ModelNotFoundError` if no candidate yields a valid model;
    /// the service can then never serve a request.
    pub fn initialize(&self) -> Result<ResolvedModel, ModelNotFoundError> {
        tracing::info!("Initializing prediction service...");
        let model = self.resolver.resolve()?;
        tracing::info!("Prediction service ready ({:?})", model);
        Ok(model)
    }

    /// Current lifecycle state of the model cache.
    #[must_use]
    pub fn state(&self) -> ResolverState {
        self.resolver.state()
    }

    #[must_use]
    pub fn resolver(&self) -> &Arc<ModelResolver> {
        &self.resolver
    }

    /// Predict SLN metastasis risk for one observation.
    ///
    /// # Errors
    /// Returns `SlnError::ModelNotFound` if the model cannot be resolved, or
    /// `SlnError::Prediction` if this request failed. A prediction failure
    /// leaves the cached model untouched.
    pub fn predict(&self, observation: &ClinicalObservation) -> Result<PredictionResult, SlnError> {
        let model = self.resolver.resolve()?;

        tracing::debug!("Validating: encoding observation {:?}", observation);
        let vector = self.builder.build(observation);

        tracing::debug!("Predicting: features {:?}", vector.values());
        let result = match self.classifier.classify(&model, &vector) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Prediction failed: {}", e);
                return Err(e.into());
            }
        };

        tracing::info!(
            "Prediction complete: probability={:.3}, risk={}",
            result.probability,
            result.risk_label
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bundle;
    use crate::adapters::estimators::{Activation, DenseLayer, Estimator, MlpClassifier};
    use crate::domain::{
        ArtifactCandidate, ArtifactLocation, ModelFormat, PredictionError, RiskLabel,
    };
    use crate::ports::{ArtifactLoader, LoadedObject, ModelObject, ProbabilisticClassifier};
    use std::collections::BTreeMap;
    use std::time::Duration;
    use tempfile::tempdir;

    fn mlp() -> Estimator {
        Estimator::Mlp(MlpClassifier {
            layers: vec![
                DenseLayer {
                    weights: vec![
                        vec![0.9, 0.45, 0.03, 0.2],
                        vec![-0.3, 0.25, 0.01, -0.5],
                        vec![0.1, -0.2, 0.04, 0.3],
                    ],
                    biases: vec![-0.5, 0.1, -0.2],
                },
                DenseLayer {
                    weights: vec![vec![1.1, -0.8, 0.6]],
                    biases: vec![-1.0],
                },
            ],
            activation: Activation::Relu,
            scaler: None,
            feature_names: Some(
                crate::domain::FEATURE_NAMES
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            ),
        })
    }

    fn service_with_model(dir: &std::path::Path) -> PredictionService {
        let path = dir.join("best_mlp_model.json");
        let bytes = bundle::encode(&mlp(), &BTreeMap::new()).expect("encode");
        std::fs::write(&path, bytes).expect("write");

        let resolver = ModelResolver::new(ArtifactLocation::new(vec![ArtifactCandidate::new(
            ModelFormat::Bundle,
            path,
        )]));
        PredictionService::new(Arc::new(resolver), RiskClassifier::new(Duration::from_secs(5)))
    }

    #[test]
    fn test_initialize_then_predict() {
        let dir = tempdir().expect("tempdir");
        let service = service_with_model(dir.path());
        assert_eq!(service.state(), ResolverState::Uninitialized);

        service.initialize().expect("initialize");
        assert_eq!(service.state(), ResolverState::Ready);

        let result = service
            .predict(&ClinicalObservation::new(false, 4.0, 0.0, false))
            .expect("predict");
        assert!((0.0..=1.0).contains(&result.probability));
        assert_eq!(result.risk_label, RiskLabel::from_probability(result.probability));
    }

    #[test]
    fn test_probability_in_unit_interval_across_domain() {
        let dir = tempdir().expect("tempdir");
        let service = service_with_model(dir.path());

        for subungual in [false, true] {
            for treatment in [false, true] {
                for breslow in [0.0, 0.1, 2.5, 4.0, 7.3, 10.0] {
                    for ki67 in [0.0, 12.5, 50.0, 99.9, 100.0] {
                        let obs = ClinicalObservation::new(subungual, breslow, ki67, treatment);
                        let result = service.predict(&obs).expect("predict");
                        assert!((0.0..=1.0).contains(&result.probability), "{obs:?}");
                        assert_eq!(result.inputs, obs);
                    }
                }
            }
        }
    }

    #[test]
    fn test_same_observation_same_result() {
        let dir = tempdir().expect("tempdir");
        let service = service_with_model(dir.path());
        let obs = ClinicalObservation::new(true, 3.2, 27.0, false);

        let a = service.predict(&obs).expect("predict");
        let b = service.predict(&obs).expect("predict");
        assert_eq!(a.probability, b.probability);
        assert_eq!(a.risk_label, b.risk_label);
    }

    #[test]
    fn test_unresolvable_model_never_ready() {
        let dir = tempdir().expect("tempdir");
        let resolver = ModelResolver::new(ArtifactLocation::new(vec![
            ArtifactCandidate::new(ModelFormat::Binary, dir.path().join("best_mlp_model.bin")),
            ArtifactCandidate::new(ModelFormat::Bundle, dir.path().join("nnet_style_model.json")),
        ]));
        let service = PredictionService::new(Arc::new(resolver), RiskClassifier::default());

        let err = service.initialize().expect_err("must fail");
        assert!(err.all_missing());
        assert_eq!(service.state(), ResolverState::Failed);

        let err = service
            .predict(&ClinicalObservation::new(false, 1.0, 1.0, false))
            .expect_err("must fail");
        assert!(matches!(err, SlnError::ModelNotFound(_)));
        assert_eq!(service.state(), ResolverState::Failed);
    }

    /// Stalls on thick tumors, answers instantly otherwise.
    #[derive(Debug)]
    struct StallsOnThick;

    impl crate::ports::ProbabilisticClassifier for StallsOnThick {
        fn n_features(&self) -> usize {
            4
        }

        fn predict_proba(
            &self,
            batch: &[Vec<f64>],
        ) -> Result<Vec<Vec<f64>>, crate::domain::ClassifierError> {
            if batch[0][1] > 9.0 {
                std::thread::sleep(Duration::from_millis(500));
            }
            Ok(vec![vec![0.6, 0.4]])
        }
    }

    impl ModelObject for StallsOnThick {
        fn kind(&self) -> &str {
            "stalls_on_thick"
        }

        fn as_classifier(&self) -> Option<&dyn ProbabilisticClassifier> {
            Some(self)
        }

        fn into_classifier(self: Box<Self>) -> Option<Arc<dyn ProbabilisticClassifier>> {
            Some(Arc::new(*self))
        }
    }

    struct StallingLoader;

    impl ArtifactLoader for StallingLoader {
        fn format(&self) -> ModelFormat {
            ModelFormat::Binary
        }

        fn load(&self, _bytes: &[u8]) -> Result<LoadedObject, String> {
            Ok(LoadedObject::Model(Box::new(StallsOnThick)))
        }
    }

    #[test]
    fn test_timeout_keeps_cached_model_serving() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("stalling.bin");
        std::fs::write(&path, b"placeholder").expect("write");

        let loaders: Vec<Arc<dyn ArtifactLoader>> = vec![Arc::new(StallingLoader)];
        let resolver = ModelResolver::with_loaders(
            ArtifactLocation::new(vec![ArtifactCandidate::new(ModelFormat::Binary, path)]),
            loaders,
        );
        let classifier = RiskClassifier::new(Duration::from_millis(50));
        let service = PredictionService::new(Arc::new(resolver), classifier);

        let before = service.initialize().expect("initialize");

        let err = service
            .predict(&ClinicalObservation::new(false, 9.5, 0.0, false))
            .expect_err("must time out");
        assert!(matches!(err, SlnError::Prediction(PredictionError::Timeout(_))));

        assert_eq!(service.state(), ResolverState::Ready);
        assert!(service.resolver().resolve().expect("resolve").ptr_eq(&before));

        let result = service
            .predict(&ClinicalObservation::new(false, 1.0, 0.0, false))
            .expect("later request served");
        assert_eq!(result.risk_label, RiskLabel::Low);
        assert!((result.probability - 0.4).abs() < 1e-12);
    }
}
