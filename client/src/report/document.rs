use super::normalize::EmbeddableImage;
use shared::ClassLabel;

#[derive(Debug, Clone, PartialEq)]
pub enum ImageSlot {
    Embedded {
        caption: &'static str,
        image: EmbeddableImage,
    },
    Placeholder {
        caption: &'static str,
        notice: String,
    },
}

impl ImageSlot {
    pub fn caption(&self) -> &'static str {
        match self {
            ImageSlot::Embedded { caption, .. } | ImageSlot::Placeholder { caption, .. } => caption,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, ImageSlot::Embedded { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Header {
        title: String,
    },
    Metadata {
        generated_at: String,
        fingerprint: Option<String>,
    },
    Diagnosis {
        label: String,
        confidence: String,
    },
    Probabilities {
        rows: Vec<(ClassLabel, String)>,
    },
    Images {
        slots: Vec<ImageSlot>,
    },
    Disclaimer {
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub file_name: String,
    pub sections: Vec<Section>,
}

impl ReportDocument {
    pub fn image_slots(&self) -> &[ImageSlot] {
        self.sections
            .iter()
            .find_map(|section| match section {
                Section::Images { slots } => Some(slots.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn embedded_captions(&self) -> Vec<&'static str> {
        self.image_slots()
            .iter()
            .filter(|slot| slot.is_embedded())
            .map(ImageSlot::caption)
            .collect()
    }
}
