//! Preprocess command - dump the normalized model input for inspection

use super::ModelArgs;
use anyhow::{Context as _, Result};
use clap::Args;
use line_ocr::load_image;
use line_ocr::preprocess::{normalize_image, scaled_width, tensor_to_luma};
use std::path::PathBuf;

#[derive(Args)]
pub struct PreprocessCommand {
    /// Input line image
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "preprocessed.png")]
    output: PathBuf,

    #[command(flatten)]
    model: ModelArgs,
}

impl PreprocessCommand {
    pub async fn execute(self) -> Result<()> {
        let config = self.model.resolve()?;
        let image = load_image(&self.input)
            .await
            .with_context(|| format!("Failed to load {}", self.input.display()))?;

        let tensor = normalize_image(&image, config.image_height, config.image_width);
        tensor_to_luma(&tensor)
            .save(&self.output)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;

        let resized_width = scaled_width(image.width(), image.height(), config.image_height);
        let (min, max) = tensor
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let mean = tensor.mean().unwrap_or(0.0);

        println!(
            "{}: {}x{} -> {}x{} ({})",
            self.input.display(),
            image.width(),
            image.height(),
            resized_width,
            config.image_height,
            layout(resized_width, config.image_width)
        );
        println!(
            "tensor {:?}: min {:.3}, max {:.3}, mean {:.3} -> {}",
            tensor.shape(),
            min,
            max,
            mean,
            self.output.display()
        );
        Ok(())
    }
}

fn layout(resized_width: u32, target_width: u32) -> String {
    if resized_width == target_width {
        "exact fit".to_string()
    } else if resized_width < target_width {
        let pad = target_width - resized_width;
        format!("padded {} left, {} right", pad / 2, pad - pad / 2)
    } else {
        format!("squeezed to {}", target_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_description() {
        assert_eq!(layout(640, 640), "exact fit");
        assert_eq!(layout(600, 640), "padded 20 left, 20 right");
        assert_eq!(layout(599, 640), "padded 20 left, 21 right");
        assert_eq!(layout(900, 640), "squeezed to 640");
    }
}
