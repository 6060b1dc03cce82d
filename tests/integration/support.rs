//! Shared fakes for the integration tests: a scripted generative model and a
//! scripted live-session connector.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

use aegis_command::{AppConfig, AppState};
use aegis_command_llm::{
    AudioFrame, ContentPart, GenerativeModel, GroundedResponse, LiveConnection, LiveConnector,
    LiveEvent, LiveSetup, LlmError, LlmResult, RetryPolicy, StructuredRequest,
    BRIEFING_SAMPLE_RATE,
};

pub const INCIDENT_TEXT: &str = "Type: Wildfire, Location: Ventura County. Severity: critical. \
     Summary: Fire front advancing on the eastern perimeter. Coords: Lat: 34.27 Lng: -119.23";

pub const SOCIAL_JSON: &str = r#"[
    {"username": "@coastwatch", "text": "Smoke visible from the harbor"},
    {"username": "@vc_resident", "text": "Evacuation sirens on Main St"}
]"#;

pub const PREDICTIONS_JSON: &str = r#"[
    {"type": "Flood", "location": "Rhine Delta", "severity": "High", "lat": 51.9, "lng": 4.5},
    {"type": "Hurricane", "location": "Gulf Coast", "severity": "Medium", "lat": 29.0, "lng": -90.0}
]"#;

pub fn rate_limited() -> LlmError {
    LlmError::RateLimited {
        message: "429 RESOURCE_EXHAUSTED".to_string(),
        retry_after: None,
    }
}

/// Model fake with separate reply queues for grounded and structured calls.
#[derive(Default)]
pub struct ScriptedModel {
    grounded: Mutex<VecDeque<LlmResult<GroundedResponse>>>,
    structured: Mutex<VecDeque<LlmResult<String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    /// When set, grounded calls wait for a notification before replying.
    gate: Option<Arc<Notify>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grounded(self, text: &str) -> Self {
        self.grounded.lock().unwrap().push_back(Ok(GroundedResponse {
            text: text.to_string(),
            citations: Vec::new(),
        }));
        self
    }

    pub fn grounded_err(self, err: LlmError) -> Self {
        self.grounded.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn structured(self, raw: &str) -> Self {
        self.structured.lock().unwrap().push_back(Ok(raw.to_string()));
        self
    }

    pub fn structured_err(self, err: LlmError) -> Self {
        self.structured.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Script one full sync: incident, chatter, predictions.
    pub fn sync_round(self, predictions: &str) -> Self {
        self.grounded(INCIDENT_TEXT)
            .structured(SOCIAL_JSON)
            .structured(predictions)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

fn exhausted() -> LlmError {
    LlmError::Other {
        message: "no scripted reply".to_string(),
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn generate_structured(&self, request: StructuredRequest) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for part in &request.parts {
            match part {
                ContentPart::Text { text } => self.prompts.lock().unwrap().push(text.clone()),
                ContentPart::InlineData { mime_type, .. } => {
                    self.prompts.lock().unwrap().push(format!("<{}>", mime_type))
                }
            }
        }
        self.structured
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted()))
    }

    async fn generate_grounded(&self, prompt: String) -> LlmResult<GroundedResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.grounded
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted()))
    }
}

/// Connector fake: replays `events`, then either closes at once or stays
/// open until the session is cancelled.
pub struct ScriptedConnector {
    events: Vec<LiveEvent>,
    hold_open: bool,
    setups: Mutex<Vec<LiveSetup>>,
    fail_with: Option<LlmError>,
}

impl ScriptedConnector {
    pub fn new(events: Vec<LiveEvent>, hold_open: bool) -> Self {
        Self {
            events,
            hold_open,
            setups: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    pub fn idle() -> Self {
        Self::new(Vec::new(), false)
    }

    pub fn failing(err: LlmError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::idle()
        }
    }

    pub fn setups(&self) -> Vec<LiveSetup> {
        self.setups.lock().unwrap().clone()
    }
}

#[async_trait]
impl LiveConnector for ScriptedConnector {
    async fn connect(&self, setup: LiveSetup) -> LlmResult<LiveConnection> {
        self.setups.lock().unwrap().push(setup);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        let (tx, rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let events = self.events.clone();
        let hold_open = self.hold_open;
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            let reason = if hold_open {
                token.cancelled().await;
                "closed by client"
            } else {
                "server done"
            };
            let _ = tx
                .send(LiveEvent::Closed {
                    reason: Some(reason.to_string()),
                })
                .await;
        });
        Ok(LiveConnection::new(rx, cancel))
    }
}

/// Half a second of audio at the briefing rate.
pub fn half_second_frame() -> AudioFrame {
    AudioFrame {
        sample_rate: BRIEFING_SAMPLE_RATE,
        samples: vec![0.25; (BRIEFING_SAMPLE_RATE / 2) as usize],
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        retry: RetryPolicy::new(2, Duration::from_millis(10)),
        ..AppConfig::default()
    }
}

pub fn state_with(
    config: AppConfig,
    model: Arc<ScriptedModel>,
    connector: Arc<ScriptedConnector>,
) -> AppState {
    AppState::new(config, model, connector)
}

pub fn test_state(model: Arc<ScriptedModel>) -> AppState {
    state_with(test_config(), model, Arc::new(ScriptedConnector::idle()))
}
