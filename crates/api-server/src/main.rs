//! API Server Binary Entry Point

use anyhow::Context as _;
use line_ocr::OcrConfig;
use line_ocr_api_server::{start_server, ApiState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "line_ocr_api_server=info,line_ocr=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match std::env::var("LINE_OCR_CONFIG") {
        Ok(path) => OcrConfig::from_yaml(&path)
            .with_context(|| format!("Failed to load config {}", path))?,
        Err(_) => OcrConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    // Get bind address from environment or use default
    let addr = std::env::var("LINE_OCR_ADDR").unwrap_or_else(|_| "0.0.0.0:2405".to_string());

    let state = ApiState::new(config);

    // Load the model up front; on failure the first request retries
    let recognizer = state.recognizer.clone();
    let warmup = tokio::task::spawn_blocking(move || recognizer.get_or_init().map(|_| ())).await?;
    if let Err(e) = warmup {
        tracing::warn!("Recognizer not loaded at startup: {}", e);
    }

    tracing::info!("Starting line OCR API server");
    start_server(&addr, state).await?;

    Ok(())
}
