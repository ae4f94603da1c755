use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid API base URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub explain_timeout_secs: Option<u64>,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub title: String,
    pub file_prefix: String,
    pub image_px: u32,
    pub jpeg_quality: u8,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            explain_timeout_secs: None,
            report: ReportConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            title: "Rose Hearts AI Analysis Report".to_string(),
            file_prefix: "RoseHearts_Report".to_string(),
            image_px: 512,
            jpeg_quality: 90,
        }
    }
}

impl ClientConfig {
    // File values first, then `API_BASE_URL` from the environment (or `.env`) on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("CLIENT_CONFIG").ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                log::info!("Loading client configuration from {}", path.display());
                Self::from_yaml(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };

        if let Ok(base_url) = std::env::var("API_BASE_URL") {
            config.api_base_url = base_url;
        }

        config.base_url()?;
        Ok(config)
    }

    pub fn from_yaml(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    // Always ends with a slash so endpoint joins append rather than replace.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.api_base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }
}
