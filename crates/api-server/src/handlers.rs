//! HTTP request handlers for API endpoints

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use line_ocr::LineEncoder;
use tracing::{debug, error, info};

use crate::{
    types::{BatchItem, HealthResponse, ServiceInfo},
    ApiState, SERVICE_NAME,
};

/// Multipart field carrying the uploaded images
pub const FILES_FIELD: &str = "files";

/// Service description with the model input shape
pub async fn service_info<E: LineEncoder + Send + 'static>(
    State(state): State<ApiState<E>>,
) -> impl IntoResponse {
    Json(ServiceInfo {
        ok: true,
        service: SERVICE_NAME.to_string(),
        input: state.recognizer.config().input_shape(),
    })
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Recognize a batch of uploaded line images
///
/// Every `files` part gets one entry in the response, in upload order. A file
/// that is empty, undecodable or fails inference yields an entry with an
/// `error` instead of failing the whole request.
pub async fn ocr_batch_printed<E: LineEncoder + Send + 'static>(
    State(state): State<ApiState<E>>,
    mut multipart: Multipart,
) -> Result<Json<Vec<BatchItem>>, (StatusCode, String)> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some(FILES_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
        uploads.push((filename, data));
    }

    if uploads.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No files provided".to_string()));
    }
    info!("Batch OCR request: {} files", uploads.len());

    let mut results = Vec::with_capacity(uploads.len());
    for (filename, data) in uploads {
        if data.is_empty() {
            results.push(BatchItem::failure(filename, "empty file"));
            continue;
        }

        let recognizer = state.recognizer.clone();
        let outcome = tokio::task::spawn_blocking(move || recognizer.recognize_bytes(&data))
            .await
            .map_err(|e| {
                error!("Recognition task failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            })?;

        results.push(match outcome {
            Ok(recognition) => BatchItem::success(filename, recognition.text, recognition.ctc_shape),
            Err(e) => {
                error!("OCR failed for {:?}: {}", filename, e);
                BatchItem::failure(filename, e.to_string())
            }
        });
    }

    Ok(Json(results))
}
