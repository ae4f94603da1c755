use super::stager::UploadedImage;
use crate::api::{ApiError, InferenceService};
use crate::navigation::ViewTransferState;
use std::cell::Cell;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("No file selected for analysis.")]
    NothingStaged,
    #[error("Analysis failed: {0}")]
    Failed(#[from] ApiError),
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Completed(ViewTransferState),
    // Another submission was already in flight.
    Ignored,
}

// Set for the lifetime of the guard, cleared however the call exits.
struct ProcessingGuard<'a>(&'a Cell<bool>);

impl<'a> ProcessingGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct SubmissionCoordinator<S> {
    service: S,
    processing: Cell<bool>,
}

impl<S: InferenceService> SubmissionCoordinator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            processing: Cell::new(false),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn is_processing(&self) -> bool {
        self.processing.get()
    }

    pub async fn submit(&self, image: &UploadedImage) -> Result<SubmitOutcome, SubmissionError> {
        let Some(_guard) = ProcessingGuard::engage(&self.processing) else {
            log::warn!("Submission already in progress, ignoring {}", image.file_name());
            return Ok(SubmitOutcome::Ignored);
        };

        log::info!("Submitting {} for classification", image.file_name());
        match self.service.predict(image).await {
            Ok(prediction) => {
                log::info!(
                    "Prediction for {}: {} ({})",
                    image.file_name(),
                    prediction.prediction,
                    prediction.confidence
                );
                Ok(SubmitOutcome::Completed(ViewTransferState::new(
                    prediction,
                    image.preview().clone(),
                )))
            }
            Err(err) => {
                log::error!("Upload failed: {}", err);
                Err(SubmissionError::Failed(err))
            }
        }
    }
}
