mod explain;
mod presentation;
mod render;

pub use explain::{ExplainState, ExplainabilityBundle, ExplainabilityFetcher, decode_overlay};
pub use presentation::{Icon, MEDICAL_DISCLAIMER, Presentation, RiskCategory, StyleBundle, Tone};
pub use render::{render_loading, render_results};

use crate::api::ApiError;
use crate::navigation::{Navigator, Route, ViewTransferState};
use crate::upload::ObjectUrl;
use shared::{ExplainResponse, PredictionResult};

// What an overlay panel shows: the decoded explanation, or the original as stand-in.
#[derive(Debug, PartialEq)]
pub enum OverlaySource<'a> {
    Explanation(&'a [u8]),
    Original(&'a ObjectUrl),
}

#[derive(Debug)]
pub struct ResultsView {
    prediction: PredictionResult,
    original_image: ObjectUrl,
    presentation: Presentation,
    explain: ExplainState,
}

impl ResultsView {
    // Both halves of the transfer must be present; anything less is a stale or direct
    // visit and the caller has to redirect instead of rendering.
    pub fn enter(state: Option<ViewTransferState>) -> Result<Self, Route> {
        let Some(ViewTransferState {
            prediction: Some(prediction),
            original_image: Some(original_image),
        }) = state
        else {
            log::warn!("Missing prediction state, redirecting.");
            return Err(Route::Upload);
        };

        let presentation = Presentation::derive(&prediction);
        Ok(Self {
            prediction,
            original_image,
            presentation,
            explain: ExplainState::Idle,
        })
    }

    // Reads the pending transfer off the navigator, redirecting when it is unusable.
    pub fn receive(navigator: &mut Navigator) -> Option<Self> {
        match Self::enter(navigator.take_state()) {
            Ok(view) => Some(view),
            Err(route) => {
                navigator.redirect(route);
                None
            }
        }
    }

    pub fn prediction(&self) -> &PredictionResult {
        &self.prediction
    }

    pub fn original_image(&self) -> &ObjectUrl {
        &self.original_image
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn explain_state(&self) -> &ExplainState {
        &self.explain
    }

    // The loading screen covers the whole view until explanations settle.
    pub fn is_loading(&self) -> bool {
        !self.explain.is_settled()
    }

    pub fn error_banner(&self) -> Option<&str> {
        match &self.explain {
            ExplainState::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn explanations(&self) -> Option<&ExplainabilityBundle> {
        match &self.explain {
            ExplainState::Loaded(bundle) => Some(bundle),
            _ => None,
        }
    }

    pub fn gradcam_source(&self) -> OverlaySource<'_> {
        self.overlay(|bundle| bundle.gradcam.as_deref())
    }

    pub fn lime_source(&self) -> OverlaySource<'_> {
        self.overlay(|bundle| bundle.lime.as_deref())
    }

    fn overlay<'a>(&'a self, pick: impl Fn(&'a ExplainabilityBundle) -> Option<&'a [u8]>) -> OverlaySource<'a> {
        self.explanations()
            .and_then(pick)
            .map(OverlaySource::Explanation)
            .unwrap_or(OverlaySource::Original(&self.original_image))
    }

    // Only the first call moves Idle -> Loading.
    pub(crate) fn begin_explain(&mut self) -> bool {
        if self.explain != ExplainState::Idle {
            log::debug!("Explanations already requested for this view");
            return false;
        }
        self.explain = ExplainState::Loading;
        log::info!("Fetching explanations");
        true
    }

    pub(crate) fn settle_explain(&mut self, outcome: Result<ExplainResponse, ApiError>) {
        self.explain = match outcome {
            Ok(response) => {
                let bundle = ExplainabilityBundle::from_response(response);
                log::info!(
                    "Explanations loaded (gradcam: {}, lime: {})",
                    bundle.gradcam.is_some(),
                    bundle.lime.is_some()
                );
                ExplainState::Loaded(bundle)
            }
            Err(err) => {
                log::error!("XAI fetch failed: {}", err);
                ExplainState::Failed {
                    message: format!("Failed to load explanations: {}", err),
                }
            }
        };
    }
}
