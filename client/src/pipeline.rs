use crate::api::InferenceService;
use crate::navigation::{Navigator, Route};
use crate::report::{ReportError, ReportSynthesizer};
use crate::results::{ExplainabilityFetcher, ResultsView, render_loading, render_results};
use crate::upload::{CandidateFile, ObjectUrlStore, UploadError, UploadPage};
use chrono::Utc;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Submission(String),
    #[error("Results view was entered without a prediction")]
    MissingResults,
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub view: ResultsView,
    pub report: Option<PathBuf>,
}

// One pass through upload, results and export for a single image.
pub struct Pipeline<S> {
    page: UploadPage<S>,
    navigator: Navigator,
    fetcher: ExplainabilityFetcher,
    synthesizer: Option<ReportSynthesizer>,
}

impl<S: InferenceService> Pipeline<S> {
    pub fn new(
        service: S,
        store: ObjectUrlStore,
        fetcher: ExplainabilityFetcher,
        synthesizer: Option<ReportSynthesizer>,
    ) -> Self {
        Self {
            page: UploadPage::new(store, service),
            navigator: Navigator::new(),
            fetcher,
            synthesizer,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn page(&self) -> &UploadPage<S> {
        &self.page
    }

    pub async fn run(&mut self, candidate: CandidateFile, out: &mut impl Write) -> Result<PipelineOutcome, PipelineError> {
        if !self.page.select_file(candidate) {
            return Err(self.page_error());
        }
        if let Some(image) = self.page.staged() {
            writeln!(out, "Selected {} ({})", image.file_name(), image.size_label())?;
        }

        writeln!(out, "Analyzing...")?;
        let Some(state) = self.page.submit().await else {
            return Err(self.page_error());
        };
        self.navigator.navigate(Route::Results, Some(state));

        let mut view = ResultsView::receive(&mut self.navigator).ok_or(PipelineError::MissingResults)?;
        writeln!(out, "{}", render_loading())?;
        self.fetcher.fetch(&mut view, self.page.service()).await;
        write!(out, "{}", render_results(&view))?;

        let report = match &self.synthesizer {
            Some(synthesizer) => {
                let path = synthesizer.export(&view, Utc::now())?;
                writeln!(out, "Report saved to {}", path.display())?;
                Some(path)
            }
            None => None,
        };

        Ok(PipelineOutcome { view, report })
    }

    fn page_error(&self) -> PipelineError {
        match self.page.error() {
            Some(UploadError::Validation(err)) => PipelineError::Rejected(err.to_string()),
            Some(UploadError::Submission(message)) => PipelineError::Submission(message.clone()),
            None => PipelineError::Submission("Analysis did not start".to_string()),
        }
    }
}
