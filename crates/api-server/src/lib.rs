//! REST API server for single-line OCR
//!
//! Endpoints:
//! - `GET /` - service description and model input shape
//! - `GET /health` - liveness
//! - `POST /ocr/batch/printed/` - multipart upload of one or more `files`
//!
//! The recognizer is shared by all requests and built on first use.

mod handlers;
mod types;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use line_ocr::{LineEncoder, OcrConfig, OnnxLineEncoder, SharedRecognizer};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use handlers::*;
pub use types::*;

/// Name reported by `GET /`
pub const SERVICE_NAME: &str = "line-ocr";

/// Default request body limit (all files of a batch together)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// API server state shared across handlers
pub struct ApiState<E: LineEncoder = OnnxLineEncoder> {
    /// Lazily initialized recognizer shared by all requests
    pub recognizer: SharedRecognizer<E>,
    /// Maximum request body size in bytes
    pub max_upload_bytes: usize,
}

impl<E: LineEncoder> Clone for ApiState<E> {
    fn clone(&self) -> Self {
        Self {
            recognizer: self.recognizer.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

impl ApiState<OnnxLineEncoder> {
    /// State backed by the ONNX recognizer described by `config`
    #[must_use]
    pub fn new(config: OcrConfig) -> Self {
        Self::with_recognizer(SharedRecognizer::new(config))
    }
}

impl<E: LineEncoder> ApiState<E> {
    #[must_use]
    pub fn with_recognizer(recognizer: SharedRecognizer<E>) -> Self {
        Self {
            recognizer,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Build the API router with all endpoints
pub fn build_router<E: LineEncoder + Send + 'static>(state: ApiState<E>) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(service_info::<E>))
        .route("/health", get(health_check))
        .route("/ocr/batch/printed/", post(ocr_batch_printed::<E>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on an already bound listener
pub async fn serve<E: LineEncoder + Send + 'static>(
    listener: TcpListener,
    state: ApiState<E>,
) -> Result<(), std::io::Error> {
    let app = build_router(state);
    axum::serve(listener, app).await
}

/// Start the API server
pub async fn start_server<E: LineEncoder + Send + 'static>(
    addr: &str,
    state: ApiState<E>,
) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}
