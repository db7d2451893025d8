//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement model
//! resolution and risk prediction.

mod classifier;
mod resolver;
mod service;
mod validator;

pub use classifier::{RiskClassifier, DEFAULT_INFERENCE_TIMEOUT};
pub use resolver::{ModelResolver, ResolvedModel, ResolverState};
pub use service::PredictionService;
pub use validator::ModelValidator;
