//! Single-line OCR with a CTC encoder via ONNX Runtime
//!
//! The model itself is a black box: a `(1, 1, 32, 640)` grayscale tensor goes in,
//! `(1, T, K)` CTC logits come out. This crate implements the deterministic
//! stages around it.
//!
//! # Pipeline
//! - [`preprocess`]: aspect-preserving resize, white padding, luma, `[-1, 1]` scaling
//! - [`encoder`]: the ONNX Runtime call, with output names resolved once per session
//! - [`ctc`]: per-frame arg-max
//! - [`tokenizer`]: vocabulary from a JSON label file and CTC collapsing
//! - [`recognizer`]: the orchestrator tying the stages together
//!
//! # Example
//! ```no_run
//! use line_ocr::{LineRecognizer, OcrConfig};
//!
//! # async fn run() -> Result<(), line_ocr::OcrError> {
//! let config = OcrConfig::from_yaml("config/line_ocr.yaml")?;
//! let mut recognizer = LineRecognizer::from_config(&config)?;
//!
//! let result = recognizer.recognize_file("line.png").await?;
//! println!("{} (logits {:?})", result.text, result.ctc_shape);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod ctc;
pub mod encoder;
pub mod error;
pub mod image_io;
pub mod onnx_utils;
pub mod preprocess;
pub mod recognizer;
pub mod tokenizer;

pub use config::{ExecutionConfig, OcrConfig};
pub use ctc::{best_path, greedy_decode};
pub use encoder::{EncoderOutput, LineEncoder, OnnxLineEncoder, RawTensor};
pub use error::{OcrError, Result};
pub use image_io::{decode_image, load_image};
pub use preprocess::normalize_image;
pub use recognizer::{LineRecognizer, Recognition, SharedRecognizer};
pub use tokenizer::{RawVocabulary, Tokenizer, BLANK_ID, CTC_OFFSET, PAD_ID};

/// Build a tokenizer from a raw `token -> value` mapping
///
/// `unk_token` defaults to `"<unk>"`.
pub fn build_tokenizer(mapping: RawVocabulary, unk_token: Option<&str>) -> Result<Tokenizer> {
    Tokenizer::build(mapping, unk_token.unwrap_or(tokenizer::DEFAULT_UNK_TOKEN))
}
