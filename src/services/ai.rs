//! Seams between the pipeline and the hosted model.
//!
//! [`StyleAnalysisService`] and [`ImageMutationService`] are implemented by
//! [`GeminiClient`](crate::services::gemini::GeminiClient) in production and by
//! in-memory mocks in tests.

use async_trait::async_trait;

use crate::models::image::{GeneratedImage, SourceImage};

/// Face analysis producing raw (unnormalized) style suggestions.
#[async_trait]
pub trait StyleAnalysisService: Send + Sync {
    /// Ask for `count` styles; returns the parsed JSON body of the answer.
    async fn analyze_styles(
        &self,
        image: &SourceImage,
        count: usize,
    ) -> Result<serde_json::Value, AiError>;
}

/// Renders one hairstyle onto the source portrait.
#[async_trait]
pub trait ImageMutationService: Send + Sync {
    async fn generate_variation(
        &self,
        image: &SourceImage,
        style_description: &str,
    ) -> Result<GeneratedImage, AiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse model response as JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model response contained no text")]
    EmptyResponse,

    #[error("Model response contained no inline image data")]
    NoImageInResponse,
}

impl AiError {
    /// Configuration errors are fatal for the whole run rather than per call.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AiError::MissingCredential)
    }
}
