//! Aegis Command LLM
//!
//! Boundary to the generative model service:
//! - Gemini `generateContent` for schema-constrained and search-grounded calls
//! - Gemini Live WebSocket sessions for spoken briefings
//!
//! Also includes the rate-limit retry wrapper, PCM audio decoding and the HTTP
//! client factory.

pub mod audio;
pub mod gemini;
pub mod http_client;
pub mod live;
pub mod provider;
pub mod retry;
pub mod types;

// Re-export main types
pub use audio::{AudioFrame, BRIEFING_SAMPLE_RATE};
pub use gemini::GeminiProvider;
pub use http_client::build_http_client;
pub use live::{GeminiLiveConnector, LiveConnection, LiveConnector, LiveEvent, LiveSetup};
pub use provider::GenerativeModel;
pub use retry::{with_retry, RateLimitSignal, RetryPolicy};
pub use types::*;
