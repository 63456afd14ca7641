//! Risk classification and the response returned to callers.

use serde::{Deserialize, Serialize};

/// Probabilities strictly above this are labelled high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.5;

/// Probabilities strictly above this get the cautionary recommendation.
///
/// Deliberately lower than [`HIGH_RISK_THRESHOLD`]: a patient in (0.4, 0.5]
/// is labelled low risk but still receives the lifestyle guidance.
pub const RECOMMENDATION_THRESHOLD: f64 = 0.4;

pub const HIGH_RISK_RECOMMENDATION: &str = "High stress levels detected – recommend daily meditation. Reduce salt intake, walk 30 mins daily and monitor BP regularly.";

pub const LOW_RISK_RECOMMENDATION: &str = "Excellent lifestyle! Continue healthy habits.";

pub const DISCLAIMER: &str = "This AI does not replace professional medical advice.";

/// Binary risk label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Low Risk")]
    Low,
}

impl RiskLevel {
    /// Label a positive-class probability.
    pub fn from_probability(probability: f64) -> Self {
        if probability > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }

    /// Wire representation of the label
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High Risk",
            RiskLevel::Low => "Low Risk",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommendation text for a positive-class probability.
pub fn recommendation_for(probability: f64) -> &'static str {
    if probability > RECOMMENDATION_THRESHOLD {
        HIGH_RISK_RECOMMENDATION
    } else {
        LOW_RISK_RECOMMENDATION
    }
}

/// Round to three decimal places.
pub fn round_probability(probability: f64) -> f64 {
    (probability * 1000.0).round() / 1000.0
}

/// Body of a successful `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub risk_level: RiskLevel,
    /// Positive-class probability rounded to 3 decimals
    pub risk_probability: f64,
    pub recommendation: String,
    pub disclaimer: String,
}

impl PredictionResponse {
    /// Apply the decision rule to a raw model probability.
    ///
    /// Thresholds are compared against the unrounded probability.
    pub fn from_probability(probability: f64) -> Self {
        Self {
            risk_level: RiskLevel::from_probability(probability),
            risk_probability: round_probability(probability),
            recommendation: recommendation_for(probability).to_string(),
            disclaimer: DISCLAIMER.to_string(),
        }
    }
}
