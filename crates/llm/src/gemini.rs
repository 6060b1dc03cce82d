//! Gemini Provider
//!
//! Implementation of the GenerativeModel trait over the Gemini
//! `generateContent` REST endpoint. Structured calls attach a response schema
//! and request `application/json`; grounded calls enable the Google Search
//! tool and surface the grounding chunks as citations.

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{missing_api_key_error, parse_http_error, GenerativeModel};
use super::types::{
    ContentPart, GroundedResponse, GroundingCitation, LlmError, LlmResult, ProviderConfig,
    StructuredRequest,
};
use crate::http_client::build_http_client;

/// Default Gemini REST endpoint
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider
pub struct GeminiProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(config.proxy.as_ref())?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_API_URL)
            .trim_end_matches('/');
        format!("{}/models/{}:generateContent", base, self.config.model)
    }

    fn part_to_gemini(part: &ContentPart) -> serde_json::Value {
        match part {
            ContentPart::Text { text } => serde_json::json!({ "text": text }),
            ContentPart::InlineData { mime_type, data } => serde_json::json!({
                "inlineData": {
                    "mimeType": mime_type,
                    "data": data
                }
            }),
        }
    }

    /// Build the request body for a schema-constrained call
    fn build_structured_body(request: &StructuredRequest) -> serde_json::Value {
        let parts: Vec<serde_json::Value> =
            request.parts.iter().map(Self::part_to_gemini).collect();

        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": parts
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.schema
            }
        })
    }

    /// Build the request body for a search-grounded call
    fn build_grounded_body(prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "tools": [{ "google_search": {} }]
        })
    }

    async fn post(&self, body: &serde_json::Value) -> LlmResult<GeminiResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("gemini"))?;

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            tracing::debug!(status, model = %self.config.model, "gemini request failed");
            return Err(parse_http_error(status, &body_text, "gemini"));
        }

        serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
            message: format!("Failed to parse response envelope: {}", e),
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate_structured(&self, request: StructuredRequest) -> LlmResult<String> {
        let body = Self::build_structured_body(&request);
        let response = self.post(&body).await?;
        Ok(response.text())
    }

    async fn generate_grounded(&self, prompt: String) -> LlmResult<GroundedResponse> {
        let body = Self::build_grounded_body(&prompt);
        let response = self.post(&body).await?;
        Ok(GroundedResponse {
            text: response.text(),
            citations: response.citations(),
        })
    }
}

/// Gemini `generateContent` response envelope
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingCitation>,
}

impl GeminiResponse {
    /// Concatenated text of the first candidate; empty when absent.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn citations(&self) -> Vec<GroundingCitation> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| m.grounding_chunks.clone())
            .unwrap_or_default()
    }
}
