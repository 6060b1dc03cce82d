//! Model Boundary Types
//!
//! Request/response shapes shared by every provider implementation, plus the
//! provider error taxonomy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use aegis_command_core::ProxyConfig;

/// Default model for structured and search-grounded generation.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default model for bidirectional audio sessions.
pub const DEFAULT_LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-12-2025";

/// Connection settings for a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (never persisted; injected from the environment)
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    /// REST base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// WebSocket endpoint override for live sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            live_url: None,
            model: DEFAULT_MODEL.to_string(),
            proxy: None,
        }
    }
}

/// One part of a request turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// Base64-encoded binary payload (e.g. an image)
    InlineData { mime_type: String, data: String },
}

/// Primitive types an output schema can constrain a field to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// Output shape constraint sent alongside a structured-generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ResponseSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ResponseSchema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ResponseSchema {
    fn of(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            description: None,
            properties: None,
            items: None,
            required: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::of(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::of(SchemaType::Number)
    }

    pub fn integer() -> Self {
        Self::of(SchemaType::Integer)
    }

    pub fn boolean() -> Self {
        Self::of(SchemaType::Boolean)
    }

    pub fn object() -> Self {
        Self {
            properties: Some(BTreeMap::new()),
            ..Self::of(SchemaType::Object)
        }
    }

    pub fn array(items: ResponseSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array)
        }
    }

    /// Add a property (turns the schema into an object if it was not one).
    pub fn property(mut self, name: impl Into<String>, schema: ResponseSchema) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), schema);
        self
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A schema-constrained generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    pub parts: Vec<ContentPart>,
    pub schema: ResponseSchema,
}

impl StructuredRequest {
    pub fn text(prompt: impl Into<String>, schema: ResponseSchema) -> Self {
        Self {
            parts: vec![ContentPart::Text {
                text: prompt.into(),
            }],
            schema,
        }
    }

    /// Prepend an inline binary part, so the payload precedes the instruction.
    pub fn with_inline_data(
        mut self,
        mime_type: impl Into<String>,
        data: impl Into<String>,
    ) -> Self {
        self.parts.insert(
            0,
            ContentPart::InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        );
        self
    }
}

/// Web reference attached to a grounding citation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebReference {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Source reference accompanying a search-grounded response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingCitation {
    #[serde(default)]
    pub web: Option<WebReference>,
}

/// Free text plus citations from a search-grounded call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundedResponse {
    pub text: String,
    pub citations: Vec<GroundingCitation>,
}

/// Error types for model operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Authentication failed (invalid API key)
    AuthenticationFailed { message: String },
    /// Rate limit exceeded
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },
    /// Model not found or not available
    ModelNotFound { model: String },
    /// Invalid request (bad parameters)
    InvalidRequest { message: String },
    /// Server error from the provider
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Network/connection error
    NetworkError { message: String },
    /// Response parsing error
    ParseError { message: String },
    /// Provider not reachable or session not open
    ProviderUnavailable { message: String },
    /// Other error
    Other { message: String },
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            LlmError::RateLimited { message, .. } => write!(f, "Rate limited: {}", message),
            LlmError::ModelNotFound { model } => write!(f, "Model not found: {}", model),
            LlmError::InvalidRequest { message } => write!(f, "Invalid request: {}", message),
            LlmError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            LlmError::NetworkError { message } => write!(f, "Network error: {}", message),
            LlmError::ParseError { message } => write!(f, "Parse error: {}", message),
            LlmError::ProviderUnavailable { message } => {
                write!(f, "Provider unavailable: {}", message)
            }
            LlmError::Other { message } => write!(f, "Error: {}", message),
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    /// Textual markers that identify quota exhaustion when the status code
    /// was lost on the way (e.g. wrapped in a transport error).
    const RATE_LIMIT_MARKERS: [&'static str; 2] = ["429", "RESOURCE_EXHAUSTED"];

    fn message(&self) -> &str {
        match self {
            LlmError::AuthenticationFailed { message }
            | LlmError::RateLimited { message, .. }
            | LlmError::InvalidRequest { message }
            | LlmError::ServerError { message, .. }
            | LlmError::NetworkError { message }
            | LlmError::ParseError { message }
            | LlmError::ProviderUnavailable { message }
            | LlmError::Other { message } => message,
            LlmError::ModelNotFound { model } => model,
        }
    }

    /// Whether this failure carries a rate-limit signature.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ServerError {
                status: Some(429), ..
            } => true,
            other => {
                let message = other.message();
                Self::RATE_LIMIT_MARKERS
                    .iter()
                    .any(|marker| message.contains(marker))
            }
        }
    }
}

/// Result type for model operations
pub type LlmResult<T> = Result<T, LlmError>;
