//! Error types for line recognition

use crate::onnx_utils::OnnxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Vocabulary mapping is empty")]
    EmptyVocabulary,

    #[error("Primary model output not found (looked for {expected:?}, model declares {available:?})")]
    MissingOutput {
        expected: Vec<String>,
        available: Vec<String>,
    },

    #[error("Unexpected {name} shape: {shape:?} (expected [1, T, K])")]
    ShapeMismatch { name: String, shape: Vec<i64> },

    #[error("Image file is empty")]
    EmptyImage,

    #[error("Recognizer lock poisoned")]
    LockPoisoned,

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("ONNX session error: {0}")]
    Onnx(#[from] OnnxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl OcrError {
    /// True for errors raised because the model output violates the `[1, T, K]` contract
    #[must_use]
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self,
            OcrError::MissingOutput { .. } | OcrError::ShapeMismatch { .. }
        )
    }
}

/// Result type for line recognition
pub type Result<T> = std::result::Result<T, OcrError>;
