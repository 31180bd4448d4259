use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AppConfig;
use crate::models::image::{GeneratedImage, SourceImage};
use crate::services::ai::{AiError, ImageMutationService, StyleAnalysisService};
use crate::services::prompts;

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    analysis_model: String,
    image_model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One content segment: text, inline binary data, or something we ignore.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, alias = "inline_data", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, alias = "mime_type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self, AiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(AiError::Http)?;

        Ok(Self {
            http,
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            api_key: config
                .gemini_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            analysis_model: config.analysis_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    fn api_key(&self) -> Result<&str, AiError> {
        self.api_key.as_deref().ok_or(AiError::MissingCredential)
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AiError> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(AiError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(AiError::Http)
    }
}

fn image_and_text(image: &SourceImage, text: String) -> Vec<Content> {
    vec![Content {
        parts: vec![
            Part {
                inline_data: Some(InlineData {
                    mime_type: Some(image.mime_type.clone()),
                    data: image.data.clone(),
                }),
                ..Part::default()
            },
            Part {
                text: Some(text),
                ..Part::default()
            },
        ],
    }]
}

fn style_list_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "INTEGER" },
                "label": { "type": "STRING" },
                "promptDescription": { "type": "STRING" }
            },
            "required": ["id", "label", "promptDescription"]
        }
    })
}

/// Concatenated text of the first candidate.
pub fn response_text(response: &GenerateContentResponse) -> Result<String, AiError> {
    let text: String = response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        return Err(AiError::EmptyResponse);
    }
    Ok(text)
}

/// First part carrying inline image data, across all candidates.
pub fn extract_inline_image(response: &GenerateContentResponse) -> Result<GeneratedImage, AiError> {
    response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
        .map(|inline| GeneratedImage::new(inline.mime_type.clone(), inline.data.clone()))
        .ok_or(AiError::NoImageInResponse)
}

#[async_trait]
impl StyleAnalysisService for GeminiClient {
    async fn analyze_styles(
        &self,
        image: &SourceImage,
        count: usize,
    ) -> Result<serde_json::Value, AiError> {
        let request = GenerateContentRequest {
            contents: image_and_text(image, prompts::style_analysis_prompt(count)),
            generation_config: Some(serde_json::json!({
                "responseMimeType": "application/json",
                "responseSchema": style_list_schema(),
            })),
        };

        let response = self.generate_content(&self.analysis_model, &request).await?;
        let text = response_text(&response)?;

        serde_json::from_str(&text).map_err(AiError::Parse)
    }
}

#[async_trait]
impl ImageMutationService for GeminiClient {
    async fn generate_variation(
        &self,
        image: &SourceImage,
        style_description: &str,
    ) -> Result<GeneratedImage, AiError> {
        let request = GenerateContentRequest {
            contents: image_and_text(image, prompts::variation_prompt(style_description)),
            generation_config: Some(serde_json::json!({
                "responseModalities": ["IMAGE", "TEXT"],
            })),
        };

        let response = self.generate_content(&self.image_model, &request).await?;
        extract_inline_image(&response)
    }
}
