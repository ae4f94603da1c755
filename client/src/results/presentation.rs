use shared::PredictionResult;

pub const MEDICAL_DISCLAIMER: &str = "Medical Disclaimer: This AI analysis is a screening tool and should not replace professional medical diagnosis. Always consult with a qualified healthcare provider.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskCategory {
    HighRisk,
    LowRisk,
    NormalTissue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    CheckCircle,
    XCircle,
    Info,
}

impl Icon {
    pub fn glyph(&self) -> &'static str {
        match self {
            Icon::CheckCircle => "✔",
            Icon::XCircle => "✖",
            Icon::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Red,
    Green,
    Blue,
}

impl Tone {
    pub fn name(&self) -> &'static str {
        match self {
            Tone::Red => "red",
            Tone::Green => "green",
            Tone::Blue => "blue",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct StyleBundle {
    pub icon: Icon,
    pub tone: Tone,
    pub description: &'static str,
}

const LOW_RISK_STYLE: StyleBundle = StyleBundle {
    icon: Icon::CheckCircle,
    tone: Tone::Green,
    description: "The AI model indicates a low probability of malignancy. This result should be reviewed by a specialist.",
};

const HIGH_RISK_STYLE: StyleBundle = StyleBundle {
    icon: Icon::XCircle,
    tone: Tone::Red,
    description: "The AI model has detected high probability of malignancy. Immediate consultation with a healthcare professional is recommended.",
};

const NORMAL_TISSUE_STYLE: StyleBundle = StyleBundle {
    icon: Icon::Info,
    tone: Tone::Blue,
    description: "The AI model indicates normal tissue. Routine follow-up is recommended.",
};

impl RiskCategory {
    // Expects the lower-cased service label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "malignant" => Some(RiskCategory::HighRisk),
            "benign" => Some(RiskCategory::LowRisk),
            "normal" => Some(RiskCategory::NormalTissue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::HighRisk => "high-risk",
            RiskCategory::LowRisk => "low-risk",
            RiskCategory::NormalTissue => "normal-tissue",
        }
    }

    pub fn style(&self) -> &'static StyleBundle {
        match self {
            RiskCategory::HighRisk => &HIGH_RISK_STYLE,
            RiskCategory::LowRisk => &LOW_RISK_STYLE,
            RiskCategory::NormalTissue => &NORMAL_TISSUE_STYLE,
        }
    }
}

// Display values derived from a prediction. Pure; the prediction never changes after
// it is received, so the results view derives this once.
#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub display_label: String,
    pub confidence_percent: String,
    pub risk: Option<RiskCategory>,
}

impl Presentation {
    pub fn derive(result: &PredictionResult) -> Self {
        let raw_label = result.prediction.to_lowercase();
        let confidence = result.confidence.trim().parse::<f64>().unwrap_or(f64::NAN);

        Self {
            display_label: capitalize(&raw_label),
            confidence_percent: percent(confidence),
            risk: RiskCategory::from_label(&raw_label),
        }
    }

    // `None` for labels outside the known three: render unstyled.
    pub fn style(&self) -> Option<&'static StyleBundle> {
        self.risk.map(|risk| risk.style())
    }
}

// Two decimals with ties rounded away from zero; `{:.2}` alone would round an exact
// tie like 12.125 to even.
fn percent(value: f64) -> String {
    format!("{:.2}%", (value * 100.0).round() / 100.0)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
