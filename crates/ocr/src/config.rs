//! Recognizer configuration

use crate::error::{OcrError, Result};
use crate::preprocess::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::tokenizer::DEFAULT_UNK_TOKEN;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// ONNX Runtime execution settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Intra-op thread count (defaults to `LINE_OCR_THREADS`, then physical cores)
    #[serde(default)]
    pub intra_threads: Option<usize>,
}

/// Configuration for a line recognizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Path to the CTC encoder ONNX model
    pub model_path: PathBuf,
    /// Path to the JSON `token -> id` label file
    pub vocab_path: PathBuf,
    /// Token used for out-of-vocabulary predictions (never emitted)
    pub unk_token: String,
    /// Model input height
    pub image_height: u32,
    /// Model input width
    pub image_width: u32,
    /// Name of the model's image input
    pub input_name: String,
    /// Accepted names for the CTC logits output, in preference order
    pub logits_outputs: Vec<String>,
    /// Accepted names for the optional embedding output
    pub embedding_outputs: Vec<String>,
    /// Use the model's first output when no logits name matches
    pub fallback_to_first_output: bool,
    pub execution: ExecutionConfig,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ocr_encoder.onnx"),
            vocab_path: PathBuf::from("models/vocab_char.json"),
            unk_token: DEFAULT_UNK_TOKEN.to_string(),
            image_height: DEFAULT_HEIGHT,
            image_width: DEFAULT_WIDTH,
            input_name: "imgs".to_string(),
            logits_outputs: vec!["ctc_logits".to_string()],
            embedding_outputs: vec!["mem_proj".to_string()],
            fallback_to_first_output: true,
            execution: ExecutionConfig::default(),
        }
    }
}

impl OcrConfig {
    /// Load configuration from a YAML file; missing keys take their defaults
    pub fn from_yaml(yaml_path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(yaml_path.as_ref())?;
        let config: OcrConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the recognizer relies on
    pub fn validate(&self) -> Result<()> {
        if self.image_height == 0 || self.image_width == 0 {
            return Err(OcrError::Configuration(format!(
                "image size must be non-zero (got {}x{})",
                self.image_width, self.image_height
            )));
        }
        if self.input_name.is_empty() {
            return Err(OcrError::Configuration(
                "input_name must not be empty".to_string(),
            ));
        }
        if self.logits_outputs.is_empty() && !self.fallback_to_first_output {
            return Err(OcrError::Configuration(
                "logits_outputs is empty and fallback_to_first_output is disabled".to_string(),
            ));
        }
        if self.unk_token.is_empty() {
            return Err(OcrError::Configuration(
                "unk_token must not be empty".to_string(),
            ));
        }
        if self.execution.intra_threads == Some(0) {
            return Err(OcrError::Configuration(
                "execution.intra_threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Model input shape `[1, 1, H, W]`
    #[must_use]
    pub fn input_shape(&self) -> [usize; 4] {
        [1, 1, self.image_height as usize, self.image_width as usize]
    }
}
