use super::presentation::MEDICAL_DISCLAIMER;
use super::{OverlaySource, ResultsView};
use shared::ClassLabel;
use strum::IntoEnumIterator;

pub fn render_loading() -> String {
    [
        "Generating Explainable AI Insights...",
        "This may take up to 20 seconds for complex models like LIME/Grad-CAM.",
    ]
    .join("\n")
}

// Plain-text rendering of the results view. Shows the loading screen until the
// explanation fetch has settled.
pub fn render_results(view: &ResultsView) -> String {
    if view.is_loading() {
        return render_loading();
    }

    let presentation = view.presentation();
    let style = presentation.style();
    let mut lines = vec![
        "Analysis Results".to_string(),
        "AI-powered diagnosis with explainable insights".to_string(),
        String::new(),
    ];

    if let Some(message) = view.error_banner() {
        lines.push(format!("[XAI Error] {}", message));
        lines.push(String::new());
    }

    let icon = style.map(|s| format!("{} ", s.icon.glyph())).unwrap_or_default();
    lines.push(format!(
        "Prediction: {}{}    Confidence: {}",
        icon, presentation.display_label, presentation.confidence_percent
    ));
    if let (Some(risk), Some(style)) = (presentation.risk, style) {
        lines.push(format!("Risk: {} ({})", risk.as_str(), style.tone.name()));
        lines.push(style.description.to_string());
    }
    lines.push(String::new());

    lines.push(format!("Grad-CAM Heatmap: {}", describe_overlay(&view.gradcam_source())));
    lines.push(format!("LIME Segmentation: {}", describe_overlay(&view.lime_source())));
    lines.push(String::new());

    lines.push("Model Performance".to_string());
    for label in ClassLabel::iter() {
        let name = label.to_string();
        let marker = if name == presentation.display_label { ">" } else { " " };
        lines.push(format!(
            "{} {:<22}{:>8}%",
            marker,
            format!("{} Probability", name),
            view.prediction().probabilities.get(label)
        ));
    }
    lines.push(String::new());
    lines.push(MEDICAL_DISCLAIMER.to_string());

    lines.join("\n")
}

fn describe_overlay(source: &OverlaySource<'_>) -> String {
    match source {
        OverlaySource::Explanation(bytes) => format!("overlay image ({} bytes)", bytes.len()),
        OverlaySource::Original(url) => format!("original image shown ({})", url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::navigation::ViewTransferState;
    use crate::upload::ObjectUrlStore;
    use shared::{ExplainResponse, PredictionResult, Probabilities};
    use std::sync::Arc;

    fn view(store: &ObjectUrlStore, label: &str) -> ResultsView {
        let prediction = PredictionResult {
            prediction: label.into(),
            confidence: "87.65".into(),
            probabilities: Probabilities {
                benign: "5.00".into(),
                malignant: "87.65".into(),
                normal: "7.35".into(),
            },
        };
        let url = store.create(Arc::new(vec![1]));
        ResultsView::enter(Some(ViewTransferState::new(prediction, url))).unwrap()
    }

    #[test]
    fn loading_screen_hides_prediction() {
        let store = ObjectUrlStore::new();
        let mut view = view(&store, "malignant");
        view.begin_explain();

        let text = render_results(&view);
        assert!(text.starts_with("Generating Explainable AI Insights"));
        assert!(!text.contains("Malignant"));
    }

    #[test]
    fn settled_view_shows_prediction_and_highlight() {
        let store = ObjectUrlStore::new();
        let mut view = view(&store, "malignant");
        view.begin_explain();
        view.settle_explain(Ok(ExplainResponse {
            gradcam_image_base64: Some("AQID".into()),
            lime_image_base64: None,
        }));

        let text = render_results(&view);
        assert!(text.contains("Prediction: ✖ Malignant    Confidence: 87.65%"));
        assert!(text.contains("Risk: high-risk (red)"));
        assert!(text.contains("Immediate consultation"));
        assert!(text.contains("Grad-CAM Heatmap: overlay image (3 bytes)"));
        assert!(text.contains("LIME Segmentation: original image shown"));
        assert!(text.contains("> Malignant Probability"));
        assert!(text.contains("  Benign Probability"));
        assert!(!text.contains("XAI Error"));
    }

    #[test]
    fn failed_fetch_renders_banner_and_prediction() {
        let store = ObjectUrlStore::new();
        let mut view = view(&store, "benign");
        view.begin_explain();
        view.settle_explain(Err(ApiError::from_error_body(500, br#"{"detail":"boom"}"#)));

        let text = render_results(&view);
        assert!(text.contains("[XAI Error] Failed to load explanations: boom"));
        assert!(text.contains("Prediction: ✔ Benign"));
        assert!(text.contains("Risk: low-risk (green)"));
    }

    #[test]
    fn unknown_label_renders_unstyled() {
        let store = ObjectUrlStore::new();
        let mut view = view(&store, "other");
        view.begin_explain();
        view.settle_explain(Ok(ExplainResponse::default()));

        let text = render_results(&view);
        assert!(text.contains("Prediction: Other    Confidence"));
        assert!(!text.contains("Risk:"));
    }
}
