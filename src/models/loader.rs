//! ONNX model loader

use crate::error::ModelError;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name (file stem)
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output name for class probabilities
    pub output_name: String,
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self, ModelError> {
        ort::init()
            .with_name("healthai-guardian")
            .commit()
            .map_err(|e| ModelError::Runtime(e.to_string()))?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX model from file.
    ///
    /// A missing file is reported before the runtime is touched, so the
    /// diagnostic always names the path that was expected.
    pub fn load_model<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel, ModelError> {
        let path = path.as_ref();
        check_model_file(path)?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()
            .map_err(unavailable(path))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(unavailable(path))?
            .with_intra_threads(self.onnx_threads)
            .map_err(unavailable(path))?
            .commit_from_file(path)
            .map_err(unavailable(path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| ModelError::Unavailable {
                path: path.to_path_buf(),
                reason: "model declares no inputs".to_string(),
            })?;

        // Exporters name the probability head "probabilities" or
        // "output_probability"; fall back to the last output.
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelError::Unavailable {
                path: path.to_path_buf(),
                reason: "model declares no outputs".to_string(),
            })?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name,
            session,
            input_name,
            output_name,
        })
    }
}

fn unavailable<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> ModelError + '_ {
    move |e| ModelError::Unavailable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Fail with [`ModelError::NotFound`] unless `path` is an existing file.
pub fn check_model_file(path: &Path) -> Result<(), ModelError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ModelError::NotFound {
            path: path.to_path_buf(),
        })
    }
}
