//! Binary artifact loader: general-purpose object serialization via bincode.
//!
//! The file holds a [`StoredObject`]: either an estimator or a one-level
//! keyed container of entries (e.g. `{"model": ..., "trained_on": ...}`).
//! Containers never nest, so decoding depth is fixed by the type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::estimators::Estimator;
use crate::domain::ModelFormat;
use crate::ports::{ArtifactLoader, LoadedObject};

/// Upper bound on artifact size accepted by the decoder.
const MAX_ARTIFACT_BYTES: u64 = 64 * 1024 * 1024;

/// On-disk representation of the binary format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoredObject {
    Model(Estimator),
    Mapping(BTreeMap<String, StoredEntry>),
    Text(String),
}

/// A value held inside a [`StoredObject::Mapping`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoredEntry {
    Model(Estimator),
    Text(String),
}

impl From<StoredEntry> for LoadedObject {
    fn from(entry: StoredEntry) -> Self {
        match entry {
            StoredEntry::Model(est) => LoadedObject::Model(Box::new(est)),
            StoredEntry::Text(_) => LoadedObject::Opaque("a string".to_string()),
        }
    }
}

impl From<StoredObject> for LoadedObject {
    fn from(stored: StoredObject) -> Self {
        match stored {
            StoredObject::Model(est) => LoadedObject::Model(Box::new(est)),
            StoredObject::Mapping(map) => {
                LoadedObject::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
            StoredObject::Text(_) => LoadedObject::Opaque("a string".to_string()),
        }
    }
}

/// Encode a stored object into binary artifact bytes.
///
/// # Errors
/// Returns a description of the serialization failure.
pub fn encode(object: &StoredObject) -> Result<Vec<u8>, String> {
    bincode::serialize(object).map_err(|e| format!("Failed to serialize artifact: {e}"))
}

/// Loader for [`ModelFormat::Binary`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryLoader;

impl ArtifactLoader for BinaryLoader {
    fn format(&self) -> ModelFormat {
        ModelFormat::Binary
    }

    fn load(&self, bytes: &[u8]) -> Result<LoadedObject, String> {
        use bincode::Options;

        // Length prefixes inside a corrupt file must not drive huge allocations.
        let stored: StoredObject = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_limit(MAX_ARTIFACT_BYTES)
            .reject_trailing_bytes()
            .deserialize(bytes)
            .map_err(|e| format!("Invalid binary artifact: {e}"))?;
        Ok(stored.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::estimators::{LinearRegression, LogisticRegression};

    #[test]
    fn test_load_bare_model() {
        let stored = StoredObject::Model(Estimator::LogisticRegression(LogisticRegression::new(
            vec![0.1, 0.2, 0.3, 0.4],
            -1.0,
        )));
        let bytes = encode(&stored).expect("encode");
        match BinaryLoader.load(&bytes).expect("load") {
            LoadedObject::Model(m) => assert_eq!(m.kind(), "logistic_regression"),
            other => panic!("unexpected object: {other:?}"),
        }
    }

    #[test]
    fn test_load_mapping() {
        let mut map = BTreeMap::new();
        map.insert(
            "model".to_string(),
            StoredEntry::Model(Estimator::LinearRegression(LinearRegression {
                coefficients: vec![1.0],
                intercept: 0.0,
            })),
        );
        map.insert("trained_on".to_string(), StoredEntry::Text("2024 cohort".into()));
        let bytes = encode(&StoredObject::Mapping(map)).expect("encode");

        match BinaryLoader.load(&bytes).expect("load") {
            LoadedObject::Mapping(m) => {
                assert!(matches!(m.get("model"), Some(LoadedObject::Model(_))));
                assert!(matches!(m.get("trained_on"), Some(LoadedObject::Opaque(_))));
            }
            other => panic!("unexpected object: {other:?}"),
        }
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = BinaryLoader.load(b"\xff\xff\xff\xff not bincode").expect_err("must fail");
        assert!(err.contains("Invalid binary artifact"));
    }

    #[test]
    fn test_json_bytes_rejected() {
        let json = br#"{"logistic_regression":{"coefficients":[1.0],"intercept":0.0}}"#;
        assert!(BinaryLoader.load(json).is_err());
    }

    #[test]
    fn test_deeply_nested_containers_rejected() {
        // Mapping { "m": Mapping { "m": ... } } laid out by hand in the
        // fixint encoding: variant tag, entry count, key length, key.
        let mut bytes = Vec::new();
        for _ in 0..200_000 {
            bytes.extend_from_slice(&1u32.to_le_bytes());
            bytes.extend_from_slice(&1u64.to_le_bytes());
            bytes.extend_from_slice(&1u64.to_le_bytes());
            bytes.push(b'm');
        }
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());

        assert!(BinaryLoader.load(&bytes).is_err());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&StoredObject::Text("x".into())).expect("encode");
        bytes.push(0);
        assert!(BinaryLoader.load(&bytes).is_err());
    }
}
