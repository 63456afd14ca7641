//! Type definitions for the inference service

pub mod patient;
pub mod prediction;

pub use patient::PatientRecord;
pub use prediction::{PredictionResponse, RiskLevel};
