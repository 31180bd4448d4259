use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000"). Unused by the render binary.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Gemini API key. Absence is only reported once a call is attempted.
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Gemini REST base URL
    #[serde(default = "default_gemini_base_url")]
    pub gemini_base_url: String,

    /// Model used for face analysis and style recommendations
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,

    /// Model used to render hairstyle variations
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Per-request timeout applied to every Gemini call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of variations generated concurrently per wave
    #[serde(default = "default_generation_concurrency")]
    pub generation_concurrency: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_analysis_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_generation_concurrency() -> usize {
    crate::services::scheduler::DEFAULT_CONCURRENCY
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build from an explicit key/value iterator (used by tests).
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}
