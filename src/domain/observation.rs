//! Clinical observation types for SLN metastasis risk prediction.
//!
//! Four inputs collected per patient: subungual location, Breslow thickness,
//! Ki67 proliferation index and prior treatment.

use serde::{Deserialize, Serialize};

/// Number of features in the trained schema.
pub const NUM_FEATURES: usize = 4;

/// Column names in the order the model was trained on.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] =
    ["Subtype", "Breslow_Thickness", "Ki67", "Supplementary_Check"];

/// A column of the trained feature schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    /// Subungual melanoma (0 = no, 1 = yes)
    Subtype,
    /// Breslow thickness in mm
    BreslowThickness,
    /// Ki67 proliferation index in %
    Ki67,
    /// Prior treatment received (0 = no, 1 = yes)
    SupplementaryCheck,
}

impl Feature {
    /// All features in schema order.
    pub const SCHEMA: [Feature; NUM_FEATURES] = [
        Feature::Subtype,
        Feature::BreslowThickness,
        Feature::Ki67,
        Feature::SupplementaryCheck,
    ];

    /// Position of this feature in the model input.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Subtype => 0,
            Self::BreslowThickness => 1,
            Self::Ki67 => 2,
            Self::SupplementaryCheck => 3,
        }
    }

    /// Column name as used by the training pipeline.
    #[must_use]
    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }

    /// Look up a feature by its column name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::SCHEMA.into_iter().find(|f| f.name() == name)
    }

    fn is_binary(self) -> bool {
        matches!(self, Self::Subtype | Self::SupplementaryCheck)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while assembling or checking an observation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObservationError {
    #[error("Unknown feature column: {0}")]
    UnknownColumn(String),

    #[error("Feature column supplied more than once: {0}")]
    DuplicateColumn(Feature),

    #[error("Missing feature column: {0}")]
    MissingColumn(Feature),

    #[error("Feature {feature} must be 0 or 1, got {value}")]
    NotBinary { feature: Feature, value: f64 },

    #[error("Unrecognized yes/no value: {0:?}")]
    YesNo(String),

    #[error("Out of range: {0:?}")]
    OutOfRange(Vec<String>),
}

/// Parse a yes/no answer as entered on a form or command line.
///
/// # Errors
/// Returns `ObservationError::YesNo` for anything other than
/// yes/no/true/false/1/0 (case-insensitive).
pub fn parse_yes_no(input: &str) -> Result<bool, ObservationError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" => Ok(false),
        _ => Err(ObservationError::YesNo(input.to_string())),
    }
}

/// Raw clinical inputs for one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalObservation {
    /// Melanoma located under the nail (Subtype)
    pub subungual: bool,

    /// Measured depth of tumor invasion in mm (Breslow_Thickness, 0-10)
    pub breslow_thickness: f64,

    /// Percentage of Ki67-positive tumor cells (Ki67, 0-100)
    pub ki67: f64,

    /// Patient has received prior treatment (Supplementary_Check)
    pub prior_treatment: bool,
}

impl ClinicalObservation {
    /// Breslow thickness domain in mm.
    pub const BRESLOW_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

    /// Ki67 domain in percent.
    pub const KI67_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

    /// Create a new observation.
    #[must_use]
    pub fn new(subungual: bool, breslow_thickness: f64, ki67: f64, prior_treatment: bool) -> Self {
        Self {
            subungual,
            breslow_thickness,
            ki67,
            prior_treatment,
        }
    }

    /// Assemble an observation from named numeric columns in any order.
    ///
    /// Boolean columns must be exactly 0 or 1.
    ///
    /// # Errors
    /// Returns error on unknown, duplicate or missing columns, or on a
    /// non-binary value in a boolean column.
    pub fn from_columns<'a, I>(columns: I) -> Result<Self, ObservationError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut slots: [Option<f64>; NUM_FEATURES] = [None; NUM_FEATURES];

        for (name, value) in columns {
            let feature = Feature::from_name(name)
                .ok_or_else(|| ObservationError::UnknownColumn(name.to_string()))?;
            if feature.is_binary() && value != 0.0 && value != 1.0 {
                return Err(ObservationError::NotBinary { feature, value });
            }
            let slot = &mut slots[feature.index()];
            if slot.is_some() {
                return Err(ObservationError::DuplicateColumn(feature));
            }
            *slot = Some(value);
        }

        let get = |feature: Feature| {
            slots[feature.index()].ok_or(ObservationError::MissingColumn(feature))
        };

        Ok(Self {
            subungual: get(Feature::Subtype)? == 1.0,
            breslow_thickness: get(Feature::BreslowThickness)?,
            ki67: get(Feature::Ki67)?,
            prior_treatment: get(Feature::SupplementaryCheck)? == 1.0,
        })
    }

    /// Encoded columns in intake order (the order the form collects them).
    ///
    /// This is deliberately not the schema order; use
    /// [`FeatureVectorBuilder`](crate::domain::FeatureVectorBuilder) to get
    /// model input.
    #[must_use]
    pub fn encoded_columns(&self) -> [(Feature, f64); NUM_FEATURES] {
        [
            (Feature::BreslowThickness, self.breslow_thickness),
            (Feature::Ki67, self.ki67),
            (Feature::Subtype, encode_flag(self.subungual)),
            (Feature::SupplementaryCheck, encode_flag(self.prior_treatment)),
        ]
    }

    /// Check the numeric fields are within their clinical domain.
    ///
    /// The inference core never calls this; range checking is the caller's
    /// responsibility.
    ///
    /// # Errors
    /// Returns every violation found.
    pub fn validate(&self) -> Result<(), ObservationError> {
        let mut errors = Vec::new();

        if !Self::BRESLOW_RANGE.contains(&self.breslow_thickness) {
            errors.push(format!(
                "Breslow thickness {} out of range [0, 10]",
                self.breslow_thickness
            ));
        }
        if !Self::KI67_RANGE.contains(&self.ki67) {
            errors.push(format!("Ki67 {} out of range [0, 100]", self.ki67));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ObservationError::OutOfRange(errors))
        }
    }
}

fn encode_flag(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// Numeric model input in schema order, tied to the observation it encodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    values: [f64; NUM_FEATURES],
    source: ClinicalObservation,
}

impl FeatureVector {
    /// Values in schema order.
    #[must_use]
    pub fn values(&self) -> &[f64; NUM_FEATURES] {
        &self.values
    }

    /// Value of a single feature.
    #[must_use]
    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// The observation this vector was built from.
    #[must_use]
    pub fn observation(&self) -> &ClinicalObservation {
        &self.source
    }

    /// Values as an owned row for batch prediction.
    #[must_use]
    pub fn to_row(&self) -> Vec<f64> {
        self.values.to_vec()
    }
}

/// Encodes observations into model input.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Encode an observation into schema order.
    ///
    /// Every value is placed by its schema index, so the result never depends
    /// on the order columns were assembled in.
    #[must_use]
    pub fn build(&self, observation: &ClinicalObservation) -> FeatureVector {
        let mut values = [0.0; NUM_FEATURES];
        for (feature, value) in observation.encoded_columns() {
            values[feature.index()] = value;
        }

        FeatureVector {
            values,
            source: *observation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names() {
        let names: Vec<&str> = Feature::SCHEMA.iter().map(|f| f.name()).collect();
        assert_eq!(names, FEATURE_NAMES);
        for (i, f) in Feature::SCHEMA.iter().enumerate() {
            assert_eq!(f.index(), i);
            assert_eq!(Feature::from_name(f.name()), Some(*f));
        }
    }

    #[test]
    fn test_build_scenario_a() {
        let obs = ClinicalObservation::new(false, 4.0, 0.0, false);
        let vector = FeatureVectorBuilder::new().build(&obs);
        assert_eq!(vector.values(), &[0.0, 4.0, 0.0, 0.0]);
        assert_eq!(vector.observation(), &obs);
    }

    #[test]
    fn test_build_encodes_flags_in_schema_slots() {
        let obs = ClinicalObservation::new(true, 2.5, 37.5, true);
        let vector = FeatureVectorBuilder::new().build(&obs);
        assert_eq!(vector.values(), &[1.0, 2.5, 37.5, 1.0]);
        assert_eq!(vector.get(Feature::Ki67), 37.5);

        let only_treatment = ClinicalObservation::new(false, 1.0, 2.0, true);
        let vector = FeatureVectorBuilder::new().build(&only_treatment);
        assert_eq!(vector.values(), &[0.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_intake_order_differs_from_schema_order() {
        let obs = ClinicalObservation::new(true, 3.0, 10.0, false);
        let intake: Vec<Feature> = obs.encoded_columns().iter().map(|(f, _)| *f).collect();
        assert_ne!(intake, Feature::SCHEMA.to_vec());
    }

    #[test]
    fn test_from_columns_any_order() {
        let expected = [1.0, 4.2, 15.0, 0.0];
        let orders: [[usize; 4]; 4] = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];
        let builder = FeatureVectorBuilder::new();

        for order in orders {
            let columns: Vec<(&str, f64)> = order
                .iter()
                .map(|&i| (FEATURE_NAMES[i], expected[i]))
                .collect();
            let obs = ClinicalObservation::from_columns(columns).expect("Should assemble");
            assert_eq!(builder.build(&obs).values(), &expected);
        }
    }

    #[test]
    fn test_from_columns_errors() {
        let missing = ClinicalObservation::from_columns([("Subtype", 0.0), ("Ki67", 1.0)]);
        assert!(matches!(missing, Err(ObservationError::MissingColumn(_))));

        let dup = ClinicalObservation::from_columns([("Ki67", 1.0), ("Ki67", 2.0)]);
        assert_eq!(dup, Err(ObservationError::DuplicateColumn(Feature::Ki67)));

        let unknown = ClinicalObservation::from_columns([("Age", 40.0)]);
        assert!(matches!(unknown, Err(ObservationError::UnknownColumn(_))));

        let not_binary = ClinicalObservation::from_columns([("Subtype", 0.5)]);
        assert!(matches!(not_binary, Err(ObservationError::NotBinary { .. })));
    }

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("Yes"), Ok(true));
        assert_eq!(parse_yes_no(" no "), Ok(false));
        assert_eq!(parse_yes_no("1"), Ok(true));
        assert!(parse_yes_no("maybe").is_err());
    }

    #[test]
    fn test_validation() {
        assert!(ClinicalObservation::new(false, 4.0, 0.0, false).validate().is_ok());
        assert!(ClinicalObservation::new(false, 10.0, 100.0, true).validate().is_ok());

        let err = ClinicalObservation::new(false, 12.0, -1.0, false)
            .validate()
            .expect_err("Should be out of range");
        match err {
            ObservationError::OutOfRange(v) => assert_eq!(v.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
