pub mod preprocess;
pub mod recognize;
pub mod vocab;

use anyhow::{Context as _, Result};
use clap::Args;
use line_ocr::OcrConfig;
use std::path::PathBuf;

/// Model, vocabulary and geometry options shared by commands
#[derive(Args, Debug, Default)]
pub struct ModelArgs {
    /// YAML configuration file (flags below override its values)
    #[arg(short, long, env = "LINE_OCR_CONFIG")]
    config: Option<PathBuf>,

    /// ONNX encoder model
    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON vocabulary (token -> id)
    #[arg(long)]
    vocab: Option<PathBuf>,

    /// Unknown token name
    #[arg(long)]
    unk: Option<String>,

    /// Model input height
    #[arg(long)]
    height: Option<u32>,

    /// Model input width
    #[arg(long)]
    width: Option<u32>,
}

impl ModelArgs {
    /// Load the config file (or defaults) and apply flag overrides
    pub fn resolve(&self) -> Result<OcrConfig> {
        let mut config = match &self.config {
            Some(path) => OcrConfig::from_yaml(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => OcrConfig::default(),
        };

        if let Some(model) = &self.model {
            config.model_path.clone_from(model);
        }
        if let Some(vocab) = &self.vocab {
            config.vocab_path.clone_from(vocab);
        }
        if let Some(unk) = &self.unk {
            config.unk_token.clone_from(unk);
        }
        if let Some(height) = self.height {
            config.image_height = height;
        }
        if let Some(width) = self.width {
            config.image_width = width;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}
