//! Image loading
//!
//! Reading a file is the only suspension point of a recognition call; decoding
//! and everything after it is synchronous.

use crate::error::{OcrError, Result};
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

/// Decode an in-memory encoded image (PNG, JPEG, WebP, BMP)
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(OcrError::EmptyImage);
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Read and decode an image file
pub async fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let image = decode_image(&bytes)?;
    debug!(
        "Loaded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}
