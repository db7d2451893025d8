//! # slnguard
//!
//! Melanoma sentinel lymph node (SLN) metastasis risk prediction core.
//!
//! This crate provides:
//! - Resolution of a trained model from an ordered list of artifact
//!   candidates, with capability validation and a once-only cache
//! - Deterministic encoding of four clinical inputs into the trained
//!   feature layout
//! - Thresholded risk classification with a bounded model call
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (observations, feature vectors, predictions, errors)
//! - `ports`: Trait definitions (`ProbabilisticClassifier`, `ArtifactLoader`)
//! - `adapters`: Concrete estimators and the binary/bundle artifact loaders
//! - `application`: Resolver, validator, classifier and prediction service
//! - `config`: Externally supplied candidate list and timeouts
//!
//! ## Example
//!
//! ```no_run
//! use slnguard::{ClinicalObservation, PredictionService, ResolverConfig};
//!
//! let config = ResolverConfig::from_env()?;
//! let service = PredictionService::from_config(&config);
//! service.initialize()?;
//!
//! let result = service.predict(&ClinicalObservation::new(false, 4.0, 0.0, false))?;
//! println!("{}", result.summary());
//! # Ok::<(), slnguard::SlnError>(())
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::{PredictionService, ResolvedModel, ResolverState};
pub use config::ResolverConfig;
pub use domain::{ClinicalObservation, PredictionResult, RiskLabel};

/// Result type for slnguard operations
pub type Result<T> = std::result::Result<T, SlnError>;

/// Main error type for slnguard
#[derive(Debug, thiserror::Error)]
pub enum SlnError {
    #[error(transparent)]
    ModelNotFound(#[from] domain::ModelNotFoundError),

    #[error(transparent)]
    Prediction(#[from] domain::PredictionError),

    #[error("Invalid observation: {0}")]
    Observation(#[from] domain::ObservationError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
