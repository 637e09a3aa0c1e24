//! Line recognition pipeline
//!
//! normalize -> encode -> validate `[1, T, K]` -> greedy CTC decode.
//!
//! [`LineRecognizer`] owns everything a call needs. [`SharedRecognizer`] is a
//! cloneable handle that builds the recognizer on first use and serializes
//! access to it, for services that share one model session.

use crate::config::OcrConfig;
use crate::ctc::greedy_decode;
use crate::encoder::{LineEncoder, OnnxLineEncoder, RawTensor};
use crate::error::{OcrError, Result};
use crate::image_io::{decode_image, load_image};
use crate::preprocess::normalize_image;
use crate::tokenizer::Tokenizer;
use image::DynamicImage;
use ndarray::ArrayView2;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info};

/// Result of recognizing one line image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    /// Decoded text
    pub text: String,
    /// Observed logits shape `[1, T, K]`
    pub ctc_shape: Vec<i64>,
    /// Observed embedding shape, if the model produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_shape: Option<Vec<i64>>,
}

/// Check the `[1, T, K]` contract and view the logits as `[T, K]`
fn logits_matrix(logits: &RawTensor) -> Result<ArrayView2<'_, f32>> {
    let mismatch = || OcrError::ShapeMismatch {
        name: logits.name.clone(),
        shape: logits.shape.clone(),
    };

    let &[batch, steps, classes] = logits.shape.as_slice() else {
        return Err(mismatch());
    };
    if batch != 1 || steps < 0 || classes < 0 {
        return Err(mismatch());
    }
    let (steps, classes) = (steps as usize, classes as usize);
    // from_shape accepts a slice longer than the view
    if steps.checked_mul(classes) != Some(logits.data.len()) {
        return Err(mismatch());
    }

    ArrayView2::from_shape((steps, classes), &logits.data)
        .map_err(|_| mismatch())
}

/// Single-line recognizer with explicit, owned state
pub struct LineRecognizer<E: LineEncoder = OnnxLineEncoder> {
    tokenizer: Arc<Tokenizer>,
    encoder: E,
    height: u32,
    width: u32,
}

impl LineRecognizer<OnnxLineEncoder> {
    /// Load the vocabulary and the ONNX model named in `config`
    pub fn from_config(config: &OcrConfig) -> Result<Self> {
        config.validate()?;
        let start = Instant::now();

        let tokenizer = Tokenizer::from_file(&config.vocab_path, &config.unk_token)?;
        let encoder = OnnxLineEncoder::from_config(config)?;

        info!(
            "Line recognizer ready in {:.3}s ({} classes, input {:?})",
            start.elapsed().as_secs_f64(),
            tokenizer.num_classes(),
            config.input_shape()
        );

        Ok(Self::with_encoder(
            Arc::new(tokenizer),
            encoder,
            config.image_height,
            config.image_width,
        ))
    }
}

impl<E: LineEncoder> LineRecognizer<E> {
    /// Assemble a recognizer from its parts
    pub fn with_encoder(tokenizer: Arc<Tokenizer>, encoder: E, height: u32, width: u32) -> Self {
        Self {
            tokenizer,
            encoder,
            height,
            width,
        }
    }

    #[must_use]
    pub fn tokenizer(&self) -> &Arc<Tokenizer> {
        &self.tokenizer
    }

    /// Model input shape `[1, 1, H, W]`
    #[must_use]
    pub fn input_shape(&self) -> [usize; 4] {
        [1, 1, self.height as usize, self.width as usize]
    }

    /// Recognize the text on a line image
    ///
    /// # Errors
    /// [`OcrError::MissingOutput`] or [`OcrError::ShapeMismatch`] when the
    /// model output breaks the `[1, T, K]` contract, or any runtime error.
    pub fn recognize(&mut self, image: &DynamicImage) -> Result<Recognition> {
        let input = normalize_image(image, self.height, self.width);
        let output = self.encoder.encode(&input)?;

        let logits = output.logits.ok_or_else(|| OcrError::MissingOutput {
            expected: self.encoder.logits_names(),
            available: self.encoder.available_outputs(),
        })?;
        let matrix = logits_matrix(&logits)?;

        if matrix.ncols() != self.tokenizer.num_classes() {
            debug!(
                "Model emits {} classes, vocabulary defines {}",
                matrix.ncols(),
                self.tokenizer.num_classes()
            );
        }

        let text = greedy_decode(matrix, &self.tokenizer);
        debug!("Decoded {:?} from logits {:?}", text, logits.shape);

        Ok(Recognition {
            text,
            ctc_shape: logits.shape,
            embedding_shape: output.embedding.map(|e| e.shape),
        })
    }

    /// Decode an encoded image and recognize it
    pub fn recognize_bytes(&mut self, bytes: &[u8]) -> Result<Recognition> {
        let image = decode_image(bytes)?;
        self.recognize(&image)
    }

    /// Load an image file and recognize it
    pub async fn recognize_file(&mut self, path: impl AsRef<Path>) -> Result<Recognition> {
        let image = load_image(path).await?;
        self.recognize(&image)
    }
}

type InitFn<E> = dyn Fn(&OcrConfig) -> Result<LineRecognizer<E>> + Send + Sync;

/// Shared, lazily initialized recognizer
///
/// Clones share one recognizer. The first call to [`SharedRecognizer::get_or_init`]
/// builds it; later calls return the same instance. A failed initialization is
/// not cached, so the next call tries again.
pub struct SharedRecognizer<E: LineEncoder = OnnxLineEncoder> {
    config: Arc<OcrConfig>,
    init: Arc<InitFn<E>>,
    cell: Arc<OnceCell<Mutex<LineRecognizer<E>>>>,
}

impl<E: LineEncoder> Clone for SharedRecognizer<E> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            init: Arc::clone(&self.init),
            cell: Arc::clone(&self.cell),
        }
    }
}

impl SharedRecognizer<OnnxLineEncoder> {
    /// Handle that loads the ONNX recognizer from `config` on first use
    #[must_use]
    pub fn new(config: OcrConfig) -> Self {
        Self::with_init(config, LineRecognizer::from_config)
    }
}

impl<E: LineEncoder> SharedRecognizer<E> {
    /// Handle with a custom initializer
    pub fn with_init<F>(config: OcrConfig, init: F) -> Self
    where
        F: Fn(&OcrConfig) -> Result<LineRecognizer<E>> + Send + Sync + 'static,
    {
        Self {
            config: Arc::new(config),
            init: Arc::new(init),
            cell: Arc::new(OnceCell::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Build the recognizer if needed and return it
    pub fn get_or_init(&self) -> Result<&Mutex<LineRecognizer<E>>> {
        self.cell.get_or_try_init(|| {
            info!("Initializing line recognizer (first use)");
            (self.init)(&self.config).map(Mutex::new)
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, LineRecognizer<E>>> {
        self.get_or_init()?
            .lock()
            .map_err(|_| OcrError::LockPoisoned)
    }

    /// Recognize a decoded image
    pub fn recognize(&self, image: &DynamicImage) -> Result<Recognition> {
        self.lock()?.recognize(image)
    }

    /// Decode an encoded image and recognize it
    ///
    /// Decoding happens before the lock is taken.
    pub fn recognize_bytes(&self, bytes: &[u8]) -> Result<Recognition> {
        let image = decode_image(bytes)?;
        self.recognize(&image)
    }
}
