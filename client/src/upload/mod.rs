mod object_url;
mod stager;
mod submission;

pub use object_url::{ObjectUrl, ObjectUrlStore};
pub use stager::{
    CandidateFile, ImageMime, ImageStager, MAX_FILE_SIZE, UploadedImage, ValidationError,
    calculate_image_hash, declared_mime_for, validate,
};
pub use submission::{SubmissionCoordinator, SubmissionError, SubmitOutcome};

use crate::api::InferenceService;
use crate::navigation::ViewTransferState;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadError {
    Validation(ValidationError),
    Submission(String),
}

impl UploadError {
    pub fn message(&self) -> String {
        match self {
            UploadError::Validation(err) => err.to_string(),
            UploadError::Submission(message) => message.clone(),
        }
    }
}

// State behind the submission entry point.
pub struct UploadPage<S> {
    stager: ImageStager,
    coordinator: SubmissionCoordinator<S>,
    error: Option<UploadError>,
    is_dragging: bool,
}

impl<S: InferenceService> UploadPage<S> {
    pub fn new(store: ObjectUrlStore, service: S) -> Self {
        Self {
            stager: ImageStager::new(store),
            coordinator: SubmissionCoordinator::new(service),
            error: None,
            is_dragging: false,
        }
    }

    pub fn set_dragging(&mut self, is_dragging: bool) {
        self.is_dragging = is_dragging;
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    // Drop and picker selection both land here.
    pub fn select_file(&mut self, candidate: CandidateFile) -> bool {
        self.is_dragging = false;
        match self.stager.stage(candidate) {
            Ok(_) => {
                self.error = None;
                true
            }
            Err(err) => {
                self.error = Some(UploadError::Validation(err));
                false
            }
        }
    }

    pub fn choose_different_file(&mut self) {
        self.stager.release();
        self.error = None;
    }

    pub fn staged(&self) -> Option<&UploadedImage> {
        self.stager.staged()
    }

    pub fn error(&self) -> Option<&UploadError> {
        self.error.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.coordinator.is_processing()
    }

    pub fn service(&self) -> &S {
        self.coordinator.service()
    }

    // A validation problem blocks submission; a failed submission does not.
    pub fn can_submit(&self) -> bool {
        self.stager.staged().is_some()
            && !self.coordinator.is_processing()
            && !matches!(self.error, Some(UploadError::Validation(_)))
    }

    pub async fn submit(&mut self) -> Option<ViewTransferState> {
        if !self.can_submit() {
            return None;
        }
        let image = self.stager.staged()?.clone();

        self.error = None;
        match self.coordinator.submit(&image).await {
            Ok(SubmitOutcome::Completed(state)) => Some(state),
            Ok(SubmitOutcome::Ignored) => None,
            Err(err) => {
                self.error = Some(UploadError::Submission(err.to_string()));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use shared::{ExplainResponse, PredictionResult, Probabilities};
    use std::cell::Cell;
    use tokio::sync::Notify;

    fn prediction() -> PredictionResult {
        PredictionResult {
            prediction: "Malignant".into(),
            confidence: "87.65".into(),
            probabilities: Probabilities {
                benign: "5.00".into(),
                malignant: "87.65".into(),
                normal: "7.35".into(),
            },
        }
    }

    #[derive(Default)]
    struct FakeService {
        calls: Cell<usize>,
        fail_with: Option<(u16, &'static str)>,
        gate: Option<Notify>,
    }

    impl InferenceService for FakeService {
        async fn predict(&self, _image: &UploadedImage) -> Result<PredictionResult, ApiError> {
            self.calls.set(self.calls.get() + 1);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.fail_with {
                Some((status, body)) => Err(ApiError::from_error_body(status, body.as_bytes())),
                None => Ok(prediction()),
            }
        }

        async fn explain_all(&self) -> Result<ExplainResponse, ApiError> {
            Ok(ExplainResponse::default())
        }
    }

    fn jpeg_candidate() -> CandidateFile {
        CandidateFile::new("scan.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF])
    }

    #[tokio::test]
    async fn successful_submit_hands_off_prediction_and_preview() {
        let mut page = UploadPage::new(ObjectUrlStore::new(), FakeService::default());
        assert!(page.select_file(jpeg_candidate()));

        let state = page.submit().await.unwrap();
        assert_eq!(state.prediction, Some(prediction()));
        assert_eq!(state.original_image.as_ref(), Some(page.staged().unwrap().preview()));
        assert!(!page.is_processing());
    }

    #[tokio::test]
    async fn failed_submit_surfaces_detail_and_allows_retry() {
        let service = FakeService {
            fail_with: Some((503, r#"{"detail":"Model failed to initialize. Check server logs."}"#)),
            ..FakeService::default()
        };
        let mut page = UploadPage::new(ObjectUrlStore::new(), service);
        page.select_file(jpeg_candidate());

        assert!(page.submit().await.is_none());
        assert_eq!(
            page.error().unwrap().message(),
            "Analysis failed: Model failed to initialize. Check server logs."
        );
        assert!(!page.is_processing());
        assert!(page.can_submit());

        page.submit().await;
        assert_eq!(page.service().calls.get(), 2);
    }

    #[tokio::test]
    async fn validation_error_blocks_submission() {
        let mut page = UploadPage::new(ObjectUrlStore::new(), FakeService::default());
        page.select_file(jpeg_candidate());
        assert!(!page.select_file(CandidateFile::new("scan.gif", "image/gif", vec![1])));

        assert_eq!(page.staged().unwrap().file_name(), "scan.jpg");
        assert!(!page.can_submit());
        assert!(page.submit().await.is_none());
        assert_eq!(page.service().calls.get(), 0);

        page.choose_different_file();
        assert!(page.staged().is_none());
        assert!(page.error().is_none());
    }

    #[test]
    fn selection_ends_a_drag() {
        let mut page = UploadPage::new(ObjectUrlStore::new(), FakeService::default());
        assert!(!page.is_dragging());

        page.set_dragging(true);
        assert!(page.is_dragging());
        page.set_dragging(false);
        assert!(!page.is_dragging());

        page.set_dragging(true);
        assert!(!page.select_file(CandidateFile::new("notes.txt", "text/plain", vec![1])));
        assert!(!page.is_dragging());

        page.set_dragging(true);
        assert!(page.select_file(jpeg_candidate()));
        assert!(!page.is_dragging());
    }

    #[tokio::test]
    async fn submit_without_staged_image_is_noop() {
        let mut page = UploadPage::new(ObjectUrlStore::new(), FakeService::default());
        assert!(page.submit().await.is_none());
        assert_eq!(page.service().calls.get(), 0);
        assert!(page.error().is_none());
    }

    #[tokio::test]
    async fn concurrent_submissions_issue_one_request() {
        let service = FakeService {
            gate: Some(Notify::new()),
            ..FakeService::default()
        };
        let coordinator = SubmissionCoordinator::new(service);
        let mut stager = ImageStager::new(ObjectUrlStore::new());
        let image = stager.stage(jpeg_candidate()).unwrap().clone();

        let first = coordinator.submit(&image);
        let second = async {
            tokio::task::yield_now().await;
            assert!(coordinator.is_processing());
            let outcome = coordinator.submit(&image).await;
            if let Some(gate) = &coordinator.service().gate {
                gate.notify_one();
            }
            outcome
        };
        let (first, second) = futures::join!(first, second);

        assert!(matches!(first, Ok(SubmitOutcome::Completed(_))));
        assert!(matches!(second, Ok(SubmitOutcome::Ignored)));
        assert_eq!(coordinator.service().calls.get(), 1);
        assert!(!coordinator.is_processing());
    }
}
