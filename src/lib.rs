//! HealthAI Guardian Library
//!
//! Heart-disease risk inference service: a strictly validated patient record
//! goes in, an ONNX classifier scores it, and a fixed decision rule turns the
//! probability into a risk label and recommendation.

pub mod api;
pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::{InferenceError, ModelError, ValidationError};
pub use feature_extractor::FeatureExtractor;
pub use models::inference::{InferenceEngine, RiskScorer};
pub use models::onnx::OnnxClassifier;
pub use types::{patient::PatientRecord, prediction::PredictionResponse};
