mod http;

pub use http::HttpInferenceService;

use crate::upload::UploadedImage;
use serde_json::Value;
use shared::{ErrorDetail, ExplainResponse, PredictionResult};
use std::time::Duration;

// Multipart field the classification endpoint reads the image from.
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    pub fn from_error_body(status: u16, body: &[u8]) -> Self {
        Self::Status {
            status,
            message: detail_message(status, body),
        }
    }
}

// Service-provided `detail` when there is one, otherwise a generic status line.
pub fn detail_message(status: u16, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<ErrorDetail>(body)
        .ok()
        .and_then(|parsed| parsed.detail);

    match detail {
        Some(Value::String(text)) if !text.is_empty() => text,
        Some(other @ (Value::Array(_) | Value::Object(_) | Value::Number(_) | Value::Bool(_))) => {
            other.to_string()
        }
        _ => format!("HTTP error! Status: {}", status),
    }
}

// The two endpoints this client consumes.
#[allow(async_fn_in_trait)]
pub trait InferenceService {
    async fn predict(&self, image: &UploadedImage) -> Result<PredictionResult, ApiError>;

    async fn explain_all(&self) -> Result<ExplainResponse, ApiError>;
}
