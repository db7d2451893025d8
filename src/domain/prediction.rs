//! Prediction result types.
//!
//! Represents the output of the SLN metastasis classifier.

use serde::{Deserialize, Serialize};

use super::ClinicalObservation;

/// Positive-class probability at or above which a patient is high risk.
pub const RISK_THRESHOLD: f64 = 0.5;

/// Risk classification for SLN metastasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Metastasis probability below the threshold
    Low,
    /// Metastasis probability at or above the threshold
    High,
}

impl RiskLabel {
    /// Classify a positive-class probability. The threshold itself is High.
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        if probability >= RISK_THRESHOLD {
            Self::High
        } else {
            Self::Low
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - SLN metastasis unlikely",
            Self::High => "High risk - SLN metastasis likely, consider biopsy",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low Risk"),
            Self::High => write!(f, "High Risk"),
        }
    }
}

/// Outcome of one inference request. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Positive-class (metastasis present) probability, 0.0 to 1.0
    pub probability: f64,

    /// Thresholded risk label
    pub risk_label: RiskLabel,

    /// The observation the prediction was made for
    pub inputs: ClinicalObservation,

    /// When the prediction was produced
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionResult {
    /// Create a result, deriving the label from the probability.
    #[must_use]
    pub fn new(probability: f64, inputs: ClinicalObservation) -> Self {
        Self {
            probability,
            risk_label: RiskLabel::from_probability(probability),
            inputs,
            created_at: chrono::Utc::now(),
        }
    }

    /// One-line verdict, e.g. `High Risk: 73.0% probability of metastasis`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {:.1}% probability of metastasis",
            self.risk_label,
            self.probability * 100.0
        )
    }

    /// Full plain-text report: verdict, guidance and the echoed inputs.
    #[must_use]
    pub fn report(&self) -> String {
        let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
        let obs = &self.inputs;
        let lines = [
            self.summary(),
            self.risk_label.description().to_string(),
            String::new(),
            "Patient Parameters Used:".to_string(),
            format!("- Breslow Thickness: {} mm", obs.breslow_thickness),
            format!("- Ki67 Index: {}%", obs.ki67),
            format!("- Subungual Melanoma: {}", yes_no(obs.subungual)),
            format!("- Prior Treatment: {}", yes_no(obs.prior_treatment)),
            String::new(),
            "For physician use only - Not a substitute for clinical judgment".to_string(),
        ];
        lines.join("\n")
    }
}
