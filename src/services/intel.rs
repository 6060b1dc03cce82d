//! Intel Service
//!
//! Every outbound model operation the dashboard performs. Each call builds its
//! prompt, runs it through the rate-limit retry wrapper and normalizes the
//! result; transport failures propagate, malformed payloads never do.

use std::sync::Arc;
use std::time::Instant;

use aegis_command_core::{
    Alert, Coordinates, LogisticsPlan, PreventionStrategy, SatelliteReport, SocialInsight,
    SocialPost,
};
use aegis_command_llm::{
    with_retry, GenerativeModel, GroundedResponse, LlmResult, RetryPolicy, StructuredRequest,
};

use crate::services::normalizer;
use crate::services::prompts;
use crate::utils::error::AppResult;

/// Default prevention target when the caller gives none.
pub const DEFAULT_PREVENTION_TARGET: &str = "Wildfire";

/// Default prevention location when the caller gives none.
pub const DEFAULT_PREVENTION_LOCATION: &str = "Regional Perimeter";

pub struct IntelService {
    model: Arc<dyn GenerativeModel>,
    retry: RetryPolicy,
}

impl IntelService {
    pub fn new(model: Arc<dyn GenerativeModel>, retry: RetryPolicy) -> Self {
        Self { model, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn structured(
        &self,
        operation: &'static str,
        request: StructuredRequest,
    ) -> AppResult<String> {
        let started = Instant::now();
        let result: LlmResult<String> = with_retry(&self.retry, || {
            let model = Arc::clone(&self.model);
            let request = request.clone();
            async move { model.generate_structured(request).await }
        })
        .await;

        match result {
            Ok(raw) => {
                tracing::debug!(
                    operation,
                    model = self.model.model(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    bytes = raw.len(),
                    "structured call complete"
                );
                Ok(raw)
            }
            Err(err) => {
                tracing::warn!(operation, error = %err, "structured call failed");
                Err(err.into())
            }
        }
    }

    async fn grounded(
        &self,
        operation: &'static str,
        prompt: String,
    ) -> AppResult<GroundedResponse> {
        let started = Instant::now();
        let result: LlmResult<GroundedResponse> = with_retry(&self.retry, || {
            let model = Arc::clone(&self.model);
            let prompt = prompt.clone();
            async move { model.generate_grounded(prompt).await }
        })
        .await;

        match result {
            Ok(response) => {
                tracing::debug!(
                    operation,
                    model = self.model.model(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    citations = response.citations.len(),
                    "grounded call complete"
                );
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(operation, error = %err, "grounded call failed");
                Err(err.into())
            }
        }
    }

    /// Search for a current major incident, biased toward `near` if given.
    pub async fn live_incident(&self, near: Option<Coordinates>) -> AppResult<Alert> {
        let response = self
            .grounded("live_incident", prompts::live_incident_prompt(near))
            .await?;
        Ok(normalizer::extract_incident(
            &response.text,
            &response.citations,
            near,
        ))
    }

    /// Synthesize public reaction posts for an incident summary.
    pub async fn social_chatter(&self, context: &str) -> AppResult<Vec<SocialPost>> {
        let raw = self
            .structured("social_chatter", prompts::social_chatter_request(context))
            .await?;
        Ok(normalizer::normalize_social_posts(&raw))
    }

    pub async fn predictions(&self) -> AppResult<Vec<Alert>> {
        let raw = self
            .structured("predictions", prompts::predictions_request())
            .await?;
        Ok(normalizer::normalize_predictions(&raw))
    }

    pub async fn analyze_satellite(
        &self,
        mime_type: &str,
        base64_data: &str,
    ) -> AppResult<SatelliteReport> {
        let raw = self
            .structured(
                "satellite",
                prompts::satellite_request(mime_type, base64_data),
            )
            .await?;
        Ok(normalizer::normalize_satellite(&raw))
    }

    pub async fn logistics_plan(&self, alert: &Alert) -> AppResult<LogisticsPlan> {
        let raw = self
            .structured("logistics", prompts::logistics_request(alert))
            .await?;
        Ok(normalizer::normalize_logistics(&raw))
    }

    pub async fn sentiment(&self, posts: &[SocialPost]) -> AppResult<SocialInsight> {
        let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
        let raw = self
            .structured("sentiment", prompts::sentiment_request(&texts))
            .await?;
        Ok(normalizer::normalize_insight(&raw))
    }

    /// Blank or missing arguments fall back to the default target/location.
    pub async fn prevention_strategy(
        &self,
        target: Option<&str>,
        location: Option<&str>,
    ) -> AppResult<PreventionStrategy> {
        let target = non_blank(target).unwrap_or(DEFAULT_PREVENTION_TARGET);
        let location = non_blank(location).unwrap_or(DEFAULT_PREVENTION_LOCATION);
        let raw = self
            .structured("prevention", prompts::prevention_request(target, location))
            .await?;
        Ok(normalizer::normalize_prevention(&raw))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
