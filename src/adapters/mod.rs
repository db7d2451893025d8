//! Adapters layer: Concrete implementations of ports.
//!
//! - `estimators`: model types that implement `ProbabilisticClassifier`
//! - `binary`: bincode artifact loader
//! - `bundle`: JSON model bundle loader

pub mod binary;
pub mod bundle;
pub mod estimators;

pub use binary::{BinaryLoader, StoredEntry, StoredObject};
pub use bundle::BundleLoader;

use std::sync::Arc;

use crate::ports::ArtifactLoader;

/// Loaders for every built-in artifact format.
#[must_use]
pub fn default_loaders() -> Vec<Arc<dyn ArtifactLoader>> {
    vec![Arc::new(BinaryLoader), Arc::new(BundleLoader)]
}
