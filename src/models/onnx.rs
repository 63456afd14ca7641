//! ONNX Runtime backed risk classifier

use crate::error::{InferenceError, ModelError};
use crate::models::inference::RiskScorer;
use crate::models::loader::{LoadedModel, ModelLoader};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Binary classifier exported to ONNX (e.g. scikit-learn via skl2onnx).
///
/// `Session::run` needs exclusive access, so the session sits behind a
/// mutex. The model itself is never modified after loading.
pub struct OnnxClassifier {
    model: Mutex<LoadedModel>,
    name: String,
    expected_features: usize,
}

impl OnnxClassifier {
    /// Load the classifier from `path`. Any failure here is fatal to startup.
    pub fn load<P: AsRef<Path>>(
        path: P,
        onnx_threads: usize,
        expected_features: usize,
    ) -> Result<Self, ModelError> {
        let path = path.as_ref();
        crate::models::loader::check_model_file(path)?;

        let loader = ModelLoader::with_threads(onnx_threads)?;
        let model = loader.load_model(path)?;

        Ok(Self {
            name: model.name.clone(),
            model: Mutex::new(model),
            expected_features,
        })
    }

    /// Run the session on one feature vector.
    fn run(&self, features: &[f32]) -> Result<[f64; 2], InferenceError> {
        let mut guard = self
            .model
            .lock()
            .map_err(|e| InferenceError::Runtime(format!("lock error: {e}")))?;
        let model = &mut *guard;

        // Input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let input_name = model.input_name.clone();
        let outputs = model
            .session
            .run(ort::inputs![input_name => input_tensor])
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        if let Some(output) = outputs.get(&model.output_name) {
            if let Some(proba) = extract_probabilities(output) {
                return Ok(proba);
            }
        }

        // Fall back to any output that is not the predicted label
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(proba) = extract_probabilities(&output) {
                debug!(model = %model.name, output = %name, "Probabilities read from fallback output");
                return Ok(proba);
            }
        }

        Err(InferenceError::MissingOutput)
    }
}

impl RiskScorer for OnnxClassifier {
    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2], InferenceError> {
        if features.len() != self.expected_features {
            return Err(InferenceError::FeatureCount {
                expected: self.expected_features,
                actual: features.len(),
            });
        }
        self.run(features)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Read `[p_negative, p_positive]` from either a probability tensor or a
/// `seq(map(int64, float))` output.
fn extract_probabilities(output: &ort::value::DynValue) -> Option<[f64; 2]> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        let classes = dims.last().copied().unwrap_or(0);
        return probabilities_from_row(classes, data);
    }

    if DynSequenceValueType::can_downcast(&output.dtype()) {
        return extract_from_sequence_map(output);
    }

    None
}

/// Interpret the first row of a `[batch, classes]` (or `[classes]`) tensor.
fn probabilities_from_row(classes: i64, data: &[f32]) -> Option<[f64; 2]> {
    match (classes, data) {
        (c, [negative, positive, ..]) if c >= 2 => Some([*negative as f64, *positive as f64]),
        (1, [positive, ..]) => Some([1.0 - *positive as f64, *positive as f64]),
        _ => None,
    }
}

/// ZipMap output: one map per batch row, class id to probability.
fn extract_from_sequence_map(output: &ort::value::DynValue) -> Option<[f64; 2]> {
    let allocator = Allocator::default();
    let sequence = output.downcast_ref::<DynSequenceValueType>().ok()?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .ok()?;
    let kv_pairs = maps.first()?.try_extract_key_values::<i64, f32>().ok()?;

    probabilities_from_pairs(&kv_pairs)
}

fn probabilities_from_pairs(kv_pairs: &[(i64, f32)]) -> Option<[f64; 2]> {
    let lookup = |class: i64| {
        kv_pairs
            .iter()
            .find(|(id, _)| *id == class)
            .map(|(_, p)| *p as f64)
    };

    match (lookup(0), lookup(1)) {
        (Some(negative), Some(positive)) => Some([negative, positive]),
        (None, Some(positive)) => Some([1.0 - positive, positive]),
        (Some(negative), None) => Some([negative, 1.0 - negative]),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_class_row() {
        let proba = probabilities_from_row(2, &[0.28, 0.72]).unwrap();
        assert!((proba[1] - 0.72).abs() < 1e-6);
        assert!((proba[0] - 0.28).abs() < 1e-6);
    }

    #[test]
    fn test_single_probability_row() {
        let proba = probabilities_from_row(1, &[0.25]).unwrap();
        assert_eq!(proba, [0.75, 0.25]);
    }

    #[test]
    fn test_empty_row() {
        assert!(probabilities_from_row(2, &[]).is_none());
        assert!(probabilities_from_row(0, &[0.5]).is_none());
    }

    #[test]
    fn test_zipmap_pairs() {
        assert_eq!(
            probabilities_from_pairs(&[(0, 0.5), (1, 0.5)]),
            Some([0.5, 0.5])
        );
        assert_eq!(probabilities_from_pairs(&[(1, 0.25)]), Some([0.75, 0.25]));
        assert_eq!(probabilities_from_pairs(&[(0, 0.75)]), Some([0.75, 0.25]));
        assert_eq!(probabilities_from_pairs(&[(7, 0.9)]), None);
    }

    #[test]
    fn test_load_missing_model_fails() {
        let err = OnnxClassifier::load("models/not_here.onnx", 1, 13)
            .err()
            .unwrap();
        assert!(matches!(err, ModelError::NotFound { .. }));
    }
}
