//! Inference engine: patient record in, risk assessment out.

use crate::error::InferenceError;
use crate::feature_extractor::FeatureExtractor;
use crate::types::patient::PatientRecord;
use crate::types::prediction::PredictionResponse;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A loaded binary classifier.
///
/// Implementations are immutable after construction and shared across
/// request handlers, so they must be `Send + Sync`.
pub trait RiskScorer: Send + Sync {
    /// Class probabilities `[p_negative, p_positive]` for one feature vector.
    fn predict_proba(&self, features: &[f32]) -> Result<[f64; 2], InferenceError>;

    /// Probability of the positive (high-risk) class.
    fn score(&self, features: &[f32]) -> Result<f64, InferenceError> {
        let [_, positive] = self.predict_proba(features)?;
        if (0.0..=1.0).contains(&positive) {
            Ok(positive)
        } else {
            Err(InferenceError::InvalidProbability(positive))
        }
    }

    /// Short name for logs
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Result of scoring one record
#[derive(Debug, Clone)]
pub struct Assessment {
    /// Unrounded positive-class probability
    pub probability: f64,
    pub response: PredictionResponse,
}

/// Runs the extract, score, decide pipeline against an injected scorer.
#[derive(Clone)]
pub struct InferenceEngine {
    scorer: Arc<dyn RiskScorer>,
    extractor: Arc<FeatureExtractor>,
}

impl InferenceEngine {
    /// Create an engine around an already-loaded scorer.
    pub fn new(scorer: Arc<dyn RiskScorer>) -> Self {
        Self {
            scorer,
            extractor: Arc::new(FeatureExtractor::new()),
        }
    }

    /// Name of the underlying scorer
    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    pub fn feature_count(&self) -> usize {
        self.extractor.feature_count()
    }

    /// Feature names in the order the scorer receives them
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.extractor.feature_names()
    }

    /// Score a validated record synchronously.
    pub fn assess(&self, record: &PatientRecord) -> Result<Assessment, InferenceError> {
        let start = Instant::now();
        let features = self.extractor.extract(record);
        let probability = self.scorer.score(&features)?;

        debug!(
            scorer = %self.scorer.name(),
            probability = probability,
            inference_us = start.elapsed().as_micros() as u64,
            "Inference complete"
        );

        Ok(Assessment {
            probability,
            response: PredictionResponse::from_probability(probability),
        })
    }

    /// Score a record on the blocking thread pool.
    ///
    /// A panic inside the scorer is reported as [`InferenceError::Aborted`]
    /// instead of tearing down the caller.
    pub async fn assess_blocking(&self, record: PatientRecord) -> Result<Assessment, InferenceError> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.assess(&record))
            .await
            .map_err(|e| InferenceError::Aborted(e.to_string()))?
    }
}
