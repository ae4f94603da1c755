use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

// The three classes the inference service can return, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ClassLabel {
    Benign,
    Malignant,
    Normal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    #[serde(rename = "Benign")]
    pub benign: String,
    #[serde(rename = "Malignant")]
    pub malignant: String,
    #[serde(rename = "Normal")]
    pub normal: String,
}

impl Probabilities {
    pub fn get(&self, label: ClassLabel) -> &str {
        match label {
            ClassLabel::Benign => &self.benign,
            ClassLabel::Malignant => &self.malignant,
            ClassLabel::Normal => &self.normal,
        }
    }
}

// Body of a successful `POST /predict`. Numeric fields stay as the service formatted them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: String,
    pub confidence: String,
    pub probabilities: Probabilities,
}

// Body of a successful `GET /explain_all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplainResponse {
    #[serde(default)]
    pub gradcam_image_base64: Option<String>,
    #[serde(default)]
    pub lime_image_base64: Option<String>,
}

// Optional body of a non-2xx response from either endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}
