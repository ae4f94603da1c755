use super::ResultsView;
use crate::api::{ApiError, InferenceService};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use shared::ExplainResponse;
use std::time::Duration;

// Decoded overlay payloads. Either may be missing independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplainabilityBundle {
    pub gradcam: Option<Vec<u8>>,
    pub lime: Option<Vec<u8>>,
}

impl ExplainabilityBundle {
    pub fn from_response(response: ExplainResponse) -> Self {
        Self {
            gradcam: decode_overlay("gradcam", response.gradcam_image_base64.as_deref()),
            lime: decode_overlay("lime", response.lime_image_base64.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExplainState {
    Idle,
    Loading,
    Loaded(ExplainabilityBundle),
    Failed { message: String },
}

impl ExplainState {
    pub fn is_settled(&self) -> bool {
        matches!(self, ExplainState::Loaded(_) | ExplainState::Failed { .. })
    }
}

// Accepts bare base64 or a `data:` URL; empty or undecodable payloads count as absent.
pub fn decode_overlay(name: &str, payload: Option<&str>) -> Option<Vec<u8>> {
    let payload = payload?.trim();
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    if encoded.is_empty() {
        return None;
    }

    match STANDARD.decode(encoded) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            log::warn!("Discarding {} overlay: {}", name, err);
            None
        }
    }
}

// Runs the one explanation request a results view is allowed.
pub struct ExplainabilityFetcher {
    timeout: Option<Duration>,
}

impl ExplainabilityFetcher {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub async fn fetch<S: InferenceService>(&self, view: &mut ResultsView, service: &S) -> bool {
        if !view.begin_explain() {
            return false;
        }

        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, service.explain_all())
                .await
                .unwrap_or(Err(ApiError::Timeout(limit))),
            None => service.explain_all().await,
        };

        view.settle_explain(outcome);
        true
    }
}
