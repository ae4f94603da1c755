mod document;
mod normalize;
mod pdf;

pub use document::{ImageSlot, ReportDocument, Section};
pub use normalize::{Canvas, EmbeddableImage, ImageSource, NormalizeError, normalize};
pub use pdf::render_pdf;

use crate::config::ReportConfig;
use crate::results::{MEDICAL_DISCLAIMER, ResultsView};
use crate::upload::calculate_image_hash;
use chrono::{DateTime, Local, Utc};
use shared::ClassLabel;
use std::path::PathBuf;
use strum::IntoEnumIterator;

pub const IMAGE_UNAVAILABLE: &str = "Image unavailable";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Results are still loading")]
    NotSettled,
    #[error("PDF assembly failed: {0}")]
    Pdf(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct ReportSynthesizer {
    config: ReportConfig,
}

impl ReportSynthesizer {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn file_name(&self, now: DateTime<Utc>) -> String {
        format!("{}_{}.pdf", self.config.file_prefix, now.format("%Y-%m-%d"))
    }

    // Refuses while explanations are in flight so a report never captures a
    // half-loaded view.
    pub fn synthesize(&self, view: &ResultsView, now: DateTime<Utc>) -> Result<ReportDocument, ReportError> {
        if view.is_loading() {
            return Err(ReportError::NotSettled);
        }

        let presentation = view.presentation();
        let probabilities = &view.prediction().probabilities;
        let fingerprint = view
            .original_image()
            .resolve()
            .map(|bytes| calculate_image_hash(&bytes));

        let sections = vec![
            Section::Header {
                title: self.config.title.clone(),
            },
            Section::Metadata {
                generated_at: now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
                fingerprint,
            },
            Section::Diagnosis {
                label: presentation.display_label.clone(),
                confidence: presentation.confidence_percent.clone(),
            },
            Section::Probabilities {
                rows: ClassLabel::iter()
                    .map(|label| (label, format!("{}%", probabilities.get(label))))
                    .collect(),
            },
            Section::Images {
                slots: self.image_slots(view),
            },
            Section::Disclaimer {
                text: MEDICAL_DISCLAIMER.to_string(),
            },
        ];

        Ok(ReportDocument {
            file_name: self.file_name(now),
            sections,
        })
    }

    // Original first, then whichever overlays arrived. A slot whose image cannot be
    // prepared becomes a placeholder; the rest of the document is unaffected.
    fn image_slots(&self, view: &ResultsView) -> Vec<ImageSlot> {
        let mut slots = vec![self.slot("Original", ImageSource::Reference(view.original_image()))];

        if let Some(bundle) = view.explanations() {
            if let Some(bytes) = bundle.gradcam.as_deref() {
                slots.push(self.slot("Grad-CAM", ImageSource::Raster(bytes)));
            }
            if let Some(bytes) = bundle.lime.as_deref() {
                slots.push(self.slot("LIME", ImageSource::Raster(bytes)));
            }
        }

        slots
    }

    fn slot(&self, caption: &'static str, source: ImageSource<'_>) -> ImageSlot {
        let canvas = Canvas {
            edge: self.config.image_px,
            quality: self.config.jpeg_quality,
        };
        match normalize(source, canvas) {
            Ok(image) => ImageSlot::Embedded { caption, image },
            Err(err) => {
                log::warn!("Error generating PDF image {}: {}", caption, err);
                ImageSlot::Placeholder {
                    caption,
                    notice: IMAGE_UNAVAILABLE.to_string(),
                }
            }
        }
    }

    // Synthesize, render, and write into the configured directory.
    pub fn export(&self, view: &ResultsView, now: DateTime<Utc>) -> Result<PathBuf, ReportError> {
        let report = self.synthesize(view, now)?;
        let bytes = render_pdf(&report)?;

        std::fs::create_dir_all(&self.config.output_dir)?;
        let path = self.config.output_dir.join(&report.file_name);
        std::fs::write(&path, bytes)?;
        log::info!("Report written to {}", path.display());
        Ok(path)
    }
}
