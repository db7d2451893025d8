//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no knowledge of storage formats
//! or concrete model implementations.

mod artifact;
mod error;
mod observation;
mod prediction;

pub use artifact::{ArtifactCandidate, ArtifactLocation, ModelFormat};
pub use error::{
    CandidateFailure, CandidateFailureCause, ClassifierError, InvalidModelError,
    ModelNotFoundError, PredictionError,
};
pub use observation::{
    parse_yes_no, ClinicalObservation, Feature, FeatureVector, FeatureVectorBuilder,
    ObservationError, FEATURE_NAMES, NUM_FEATURES,
};
pub use prediction::{PredictionResult, RiskLabel, RISK_THRESHOLD};
