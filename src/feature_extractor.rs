//! Feature extraction for heart-disease model inference.
//!
//! The classifier was trained on the raw UCI heart-disease attributes, so no
//! engineered features are derived here: extraction only fixes the column
//! order and converts to the `f32` input type of the ONNX graph.

use crate::types::patient::{PatientRecord, PATIENT_FIELDS, PATIENT_FIELD_COUNT};

/// Feature extractor that transforms patient records into model input features.
///
/// Features are emitted in the exact column order used during training:
/// age, sex, cp, trestbps, chol, fbs, restecg, thalach, exang, oldpeak,
/// slope, ca, thal.
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Create a new feature extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract the model input vector from a patient record.
    pub fn extract(&self, record: &PatientRecord) -> Vec<f32> {
        record.values().iter().map(|&v| v as f32).collect()
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        PATIENT_FIELD_COUNT
    }

    /// Get feature names in model order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        PATIENT_FIELDS.iter().map(|f| f.name).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
