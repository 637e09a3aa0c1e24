//! API response types

use serde::{Deserialize, Serialize};

/// Service description returned by `GET /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub ok: bool,
    pub service: String,
    /// Model input shape `[1, 1, H, W]`
    pub input: [usize; 4],
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Outcome for one uploaded file of a batch request
///
/// Failures carry an empty `text` and an `error` message; the rest of the
/// batch is still processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctc_shape: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItem {
    #[must_use]
    pub fn success(filename: Option<String>, text: String, ctc_shape: Vec<i64>) -> Self {
        Self {
            filename,
            text,
            ctc_shape: Some(ctc_shape),
            error: None,
        }
    }

    #[must_use]
    pub fn failure(filename: Option<String>, error: impl Into<String>) -> Self {
        Self {
            filename,
            text: String::new(),
            ctc_shape: None,
            error: Some(error.into()),
        }
    }
}
