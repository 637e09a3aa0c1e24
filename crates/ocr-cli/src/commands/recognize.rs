//! Recognize command - decode images in parallel, run the encoder on one session

use super::ModelArgs;
use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};
use line_ocr::{LineRecognizer, Recognition};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `<file>\t<text>` per line
    Text,
    /// One JSON object per line
    Jsonl,
    /// A single JSON array
    Json,
}

#[derive(Args)]
pub struct RecognizeCommand {
    /// Line images to recognize
    #[arg(value_name = "FILES", required = true)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    model: ModelArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// Outcome for one input file
#[derive(Debug, Serialize)]
struct FileResult {
    file: String,
    #[serde(flatten)]
    recognition: Option<Recognition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl RecognizeCommand {
    pub async fn execute(self) -> Result<()> {
        let start = Instant::now();
        let config = self.model.resolve()?;
        let mut recognizer =
            LineRecognizer::from_config(&config).context("Failed to load recognizer")?;

        let decoded: Vec<_> = self
            .inputs
            .par_iter()
            .map(|path| {
                std::fs::read(path)
                    .map_err(line_ocr::OcrError::from)
                    .and_then(|bytes| line_ocr::decode_image(&bytes))
            })
            .collect();

        let mut results = Vec::with_capacity(self.inputs.len());
        for (path, image) in self.inputs.iter().zip(decoded) {
            let outcome = image.and_then(|img| recognizer.recognize(&img));
            let file = path.display().to_string();
            results.push(match outcome {
                Ok(recognition) => FileResult {
                    file,
                    recognition: Some(recognition),
                    error: None,
                },
                Err(e) => {
                    error!("{}: {}", file, e);
                    FileResult {
                        file,
                        recognition: None,
                        error: Some(e.to_string()),
                    }
                }
            });
        }

        print_results(&results, self.format)?;

        let failed = results.iter().filter(|r| r.error.is_some()).count();
        info!(
            "Recognized {} of {} files in {:.3}s",
            results.len() - failed,
            results.len(),
            start.elapsed().as_secs_f64()
        );

        if failed > 0 {
            anyhow::bail!("{} of {} files failed", failed, results.len());
        }
        Ok(())
    }
}

fn print_results(results: &[FileResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for result in results {
                match (&result.recognition, &result.error) {
                    (Some(rec), _) => println!("{}\t{}", result.file, rec.text),
                    (None, Some(err)) => println!("{}\terror: {}", result.file, err),
                    (None, None) => println!("{}\t", result.file),
                }
            }
        }
        OutputFormat::Jsonl => {
            for result in results {
                println!("{}", serde_json::to_string(result)?);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_result_json_shape() {
        let ok = FileResult {
            file: "a.png".to_string(),
            recognition: Some(Recognition {
                text: "សួស្តី".to_string(),
                ctc_shape: vec![1, 160, 120],
                embedding_shape: None,
            }),
            error: None,
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({ "file": "a.png", "text": "សួស្តី", "ctc_shape": [1, 160, 120] })
        );

        let failed = FileResult {
            file: "b.png".to_string(),
            recognition: None,
            error: Some("Image file is empty".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({ "file": "b.png", "error": "Image file is empty" })
        );
    }
}
