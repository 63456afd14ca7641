//! ML model inference components

pub mod inference;
pub mod loader;
pub mod onnx;

pub use inference::{Assessment, InferenceEngine, RiskScorer};
pub use loader::ModelLoader;
pub use onnx::OnnxClassifier;
