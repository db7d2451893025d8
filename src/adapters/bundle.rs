//! Bundle artifact loader: JSON model bundles.
//!
//! A bundle is either a bare estimator object or a container holding the
//! estimator under `"model"` next to export metadata:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "model": { "mlp": { "layers": [...], "activation": "relu" } },
//!   "trained_with": "sklearn 1.5"
//! }
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use super::estimators::Estimator;
use crate::domain::ModelFormat;
use crate::ports::{ArtifactLoader, LoadedObject};

/// Key under which a container stores the model.
pub const MODEL_KEY: &str = "model";

/// Loader for [`ModelFormat::Bundle`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BundleLoader;

impl BundleLoader {
    fn convert(value: Value) -> Result<LoadedObject, String> {
        match value {
            Value::Object(map) => {
                if map.len() == 1 && map.keys().all(|k| Estimator::TAGS.contains(&k.as_str())) {
                    let estimator: Estimator = serde_json::from_value(Value::Object(map))
                        .map_err(|e| format!("Invalid estimator parameters: {e}"))?;
                    return Ok(LoadedObject::Model(Box::new(estimator)));
                }

                let entries = map
                    .into_iter()
                    .map(|(k, v)| Self::convert(v).map(|obj| (k, obj)))
                    .collect::<Result<BTreeMap<_, _>, _>>()?;
                Ok(LoadedObject::Mapping(entries))
            }
            Value::Array(_) => Ok(LoadedObject::Opaque("an array".to_string())),
            Value::String(_) => Ok(LoadedObject::Opaque("a string".to_string())),
            Value::Number(_) => Ok(LoadedObject::Opaque("a number".to_string())),
            Value::Bool(_) => Ok(LoadedObject::Opaque("a boolean".to_string())),
            Value::Null => Ok(LoadedObject::Opaque("null".to_string())),
        }
    }
}

/// Encode an estimator as a bundle, wrapped under `"model"` with metadata.
///
/// # Errors
/// Returns a description of the serialization failure.
pub fn encode(
    estimator: &Estimator,
    metadata: &BTreeMap<String, Value>,
) -> Result<Vec<u8>, String> {
    let mut root = serde_json::Map::new();
    for (k, v) in metadata {
        root.insert(k.clone(), v.clone());
    }
    let model =
        serde_json::to_value(estimator).map_err(|e| format!("Failed to serialize model: {e}"))?;
    root.insert(MODEL_KEY.to_string(), model);
    serde_json::to_vec_pretty(&Value::Object(root))
        .map_err(|e| format!("Failed to serialize bundle: {e}"))
}

impl ArtifactLoader for BundleLoader {
    fn format(&self) -> ModelFormat {
        ModelFormat::Bundle
    }

    fn load(&self, bytes: &[u8]) -> Result<LoadedObject, String> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| format!("Invalid JSON bundle: {e}"))?;
        Self::convert(value)
    }
}
