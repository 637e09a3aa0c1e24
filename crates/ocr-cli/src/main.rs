//! line-ocr CLI - single-line text recognition
//!
//! Command-line interface for the CTC line recognizer.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use rayon::ThreadPoolBuilder;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::preprocess::PreprocessCommand;
use commands::recognize::RecognizeCommand;
use commands::vocab::VocabCommand;

#[derive(Parser)]
#[command(
    name = "line-ocr",
    version,
    about = "Recognize text on single-line images with a CTC encoder",
    after_help = "EXAMPLES:\n  \
                  # Recognize one or more line images\n  \
                  line-ocr recognize --model ocr_encoder.onnx --vocab vocab_char.json line1.png line2.png\n\n  \
                  # Use a YAML config and emit JSON lines\n  \
                  line-ocr recognize --config config/line_ocr.yaml --format jsonl lines/*.png\n\n  \
                  # Inspect what the model sees\n  \
                  line-ocr preprocess line.png --output line_input.png\n\n  \
                  # Show the re-indexed vocabulary\n  \
                  line-ocr vocab --vocab vocab_char.json --limit 20"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recognize text on line images
    Recognize(RecognizeCommand),

    /// Write the normalized model input of an image as a grayscale PNG
    Preprocess(PreprocessCommand),

    /// Print the re-indexed vocabulary and class layout
    Vocab(VocabCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Limit image decoding parallelism when requested
    if let Ok(threads_str) = std::env::var("LINE_OCR_THREADS") {
        if let Ok(num_threads) = threads_str.parse::<usize>() {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .ok();
        }
    }

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Recognize(cmd) => cmd.execute().await,
        Commands::Preprocess(cmd) => cmd.execute().await,
        Commands::Vocab(cmd) => cmd.execute(),
    }
}
