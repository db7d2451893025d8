//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and concrete model types and artifact formats.

mod classifier;
mod loader;

pub use classifier::{sigmoid, ProbabilisticClassifier};
pub use loader::{ArtifactLoader, LoadedObject, ModelObject};
