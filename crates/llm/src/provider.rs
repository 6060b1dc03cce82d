//! Generative Model Trait
//!
//! Defines the common interface every remote model implementation exposes to
//! the rest of the workspace.

use async_trait::async_trait;

use super::types::{GroundedResponse, LlmError, LlmResult, StructuredRequest};

/// Trait that all generative model providers must implement.
///
/// Provides a unified interface for:
/// - Schema-constrained generation (generate_structured)
/// - Search-grounded free-text generation (generate_grounded)
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Generate a value constrained to `request.schema`.
    ///
    /// Returns the raw response text. Providers do not parse it: a
    /// non-conforming payload is the normalizer's problem, not a failure.
    async fn generate_structured(&self, request: StructuredRequest) -> LlmResult<String>;

    /// Generate free text with web-search grounding enabled.
    async fn generate_grounded(&self, prompt: String) -> LlmResult<GroundedResponse>;
}

/// Helper function to create an error for missing API key
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to parse HTTP error status codes
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 => LlmError::AuthenticationFailed {
            message: format!("{}: Invalid API key", provider),
        },
        403 => LlmError::AuthenticationFailed {
            message: format!("{}: Access denied", provider),
        },
        404 => LlmError::ModelNotFound {
            model: body.to_string(),
        },
        429 => LlmError::RateLimited {
            message: body.to_string(),
            retry_after: None,
        },
        400 => LlmError::InvalidRequest {
            message: body.to_string(),
        },
        500..=599 => LlmError::ServerError {
            message: body.to_string(),
            status: Some(status),
        },
        _ => LlmError::Other {
            message: format!("HTTP {}: {}", status, body),
        },
    }
}
