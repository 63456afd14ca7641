//! Error types for the inference service.
//!
//! Client mistakes, per-request inference failures and startup model failures
//! are kept as separate types so each maps to exactly one HTTP outcome (or to
//! a failed startup).

use serde::Serialize;
use std::path::PathBuf;

/// A single problem with one field of an inbound patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    /// Field name as supplied by the caller (or `body` for whole-payload issues)
    pub field: String,
    /// Human-readable description of the problem
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Rejection of an inbound payload. Lists every offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid patient record: {}", join_issues(&self.issues))]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<FieldIssue>) -> Self {
        Self { issues }
    }

    /// Rejection that concerns the payload as a whole rather than one field.
    pub fn body(message: impl Into<String>) -> Self {
        Self::new(vec![FieldIssue::new("body", message)])
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    /// Names of the offending fields, in the order they were found.
    pub fn fields(&self) -> Vec<&str> {
        self.issues.iter().map(|i| i.field.as_str()).collect()
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{}: {}", i.field, i.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure while scoring a single request.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("model returned an invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("model output contained no class probabilities")]
    MissingOutput,

    #[error("model runtime error: {0}")]
    Runtime(String),

    #[error("scoring task aborted: {0}")]
    Aborted(String),
}

/// Failure to make the model available at startup. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model file not found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to load model from {}: {reason}", path.display())]
    Unavailable { path: PathBuf, reason: String },

    #[error("failed to initialize ONNX Runtime: {0}")]
    Runtime(String),
}
