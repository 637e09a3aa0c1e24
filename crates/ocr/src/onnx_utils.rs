//! ONNX Runtime session construction
//!
//! Sessions are built with full graph optimization, a tuned intra-op thread
//! count and memory pattern optimization. With the `coreml` or `cuda` features
//! enabled the matching execution provider is registered ahead of the CPU
//! provider; if the accelerated session fails to build, a CPU-only session is
//! created instead.

use crate::config::ExecutionConfig;
use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Environment variable overriding the intra-op thread count
pub const THREADS_ENV: &str = "LINE_OCR_THREADS";

/// Error type for ONNX session setup
#[derive(Debug, thiserror::Error)]
pub enum OnnxError {
    #[error("Failed to create session builder: {0}")]
    SessionBuilderError(String),

    #[error("Failed to load ONNX model from {path}: {error}")]
    ModelLoadError { path: String, error: String },

    #[error("Model file not found: {0}")]
    ModelNotFound(String),
}

/// Intra-op thread count: explicit config, then `LINE_OCR_THREADS`, then physical cores
#[must_use]
pub fn resolve_intra_threads(config: &ExecutionConfig) -> usize {
    config
        .intra_threads
        .or_else(|| {
            std::env::var(THREADS_ENV)
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|&n| n > 0)
        })
        .unwrap_or_else(num_cpus::get_physical)
}

fn accelerated_providers() -> Vec<ExecutionProviderDispatch> {
    #[allow(unused_mut)]
    let mut providers = Vec::new();
    #[cfg(feature = "coreml")]
    providers.push(
        ort::execution_providers::CoreMLExecutionProvider::default()
            .with_subgraphs(true)
            .build(),
    );
    #[cfg(feature = "cuda")]
    providers.push(ort::execution_providers::CUDAExecutionProvider::default().build());
    providers
}

fn build_session(
    model_path: &Path,
    num_threads: usize,
    providers: Vec<ExecutionProviderDispatch>,
) -> Result<Session, OnnxError> {
    Session::builder()
        .map_err(|e| OnnxError::SessionBuilderError(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| OnnxError::SessionBuilderError(e.to_string()))?
        .with_intra_threads(num_threads)
        .map_err(|e| OnnxError::SessionBuilderError(e.to_string()))?
        .with_memory_pattern(true)
        .map_err(|e| OnnxError::SessionBuilderError(e.to_string()))?
        .with_execution_providers(providers)
        .map_err(|e| OnnxError::SessionBuilderError(e.to_string()))?
        .commit_from_file(model_path)
        .map_err(|e| OnnxError::ModelLoadError {
            path: model_path.display().to_string(),
            error: e.to_string(),
        })
}

/// Create an ONNX Runtime session for the line encoder
///
/// # Errors
/// [`OnnxError::ModelNotFound`] if `model_path` does not exist, otherwise the
/// builder or load failure of the CPU session.
pub fn create_session(model_path: &Path, config: &ExecutionConfig) -> Result<Session, OnnxError> {
    if !model_path.exists() {
        return Err(OnnxError::ModelNotFound(model_path.display().to_string()));
    }

    let num_threads = resolve_intra_threads(config);
    let start = Instant::now();

    let accelerated = accelerated_providers();
    if !accelerated.is_empty() {
        let mut providers = accelerated;
        providers.push(CPUExecutionProvider::default().build());
        match build_session(model_path, num_threads, providers) {
            Ok(session) => {
                info!(
                    "Loaded {} with accelerated providers in {:.3}s ({} threads)",
                    model_path.display(),
                    start.elapsed().as_secs_f64(),
                    num_threads
                );
                return Ok(session);
            }
            Err(e) => {
                warn!("Accelerated session failed, retrying on CPU: {}", e);
            }
        }
    }

    let session = build_session(
        model_path,
        num_threads,
        vec![CPUExecutionProvider::default().build()],
    )?;
    debug!(
        "CPU session for {} created in {:.3}s ({} threads)",
        model_path.display(),
        start.elapsed().as_secs_f64(),
        num_threads
    );
    Ok(session)
}
