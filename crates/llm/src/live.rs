//! Live Audio Sessions
//!
//! Bidirectional sessions against the Gemini Live WebSocket endpoint. A
//! session is opened with a system instruction and a prebuilt voice; the
//! server streams PCM frames back, which are surfaced as `LiveEvent`s on a
//! channel. The local side may close the session at any time through the
//! connection's cancellation token.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::audio::{decode_pcm16_base64, sample_rate_from_mime, AudioFrame, BRIEFING_SAMPLE_RATE};
use crate::provider::missing_api_key_error;
use crate::types::{LlmError, LlmResult, ProviderConfig};

/// Default Gemini Live endpoint
const GEMINI_LIVE_URL: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Buffered events per session before the reader applies back-pressure.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Parameters for opening a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSetup {
    pub model: String,
    pub voice: String,
    pub system_instruction: String,
    /// User turn sent once the server acknowledges setup
    pub kickoff: Option<String>,
}

/// Session lifecycle and payload events.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Opened,
    Audio(AudioFrame),
    TurnComplete,
    Closed { reason: Option<String> },
    Error { message: String },
}

/// An open session: its event stream plus a handle to end it.
pub struct LiveConnection {
    events: mpsc::Receiver<LiveEvent>,
    cancel: CancellationToken,
}

impl LiveConnection {
    pub fn new(events: mpsc::Receiver<LiveEvent>, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }

    /// Next event, or `None` once the session task has finished.
    pub async fn next_event(&mut self) -> Option<LiveEvent> {
        self.events.recv().await
    }

    /// Token that ends the session when cancelled.
    pub fn closer(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }
}

/// Opens live audio sessions.
#[async_trait]
pub trait LiveConnector: Send + Sync {
    async fn connect(&self, setup: LiveSetup) -> LlmResult<LiveConnection>;
}

/// Build the first client message of a session.
pub fn setup_message(setup: &LiveSetup) -> serde_json::Value {
    serde_json::json!({
        "setup": {
            "model": format!("models/{}", setup.model),
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": setup.voice }
                    }
                }
            },
            "systemInstruction": {
                "parts": [{ "text": setup.system_instruction }]
            }
        }
    })
}

/// Build a complete user turn.
pub fn kickoff_message(text: &str) -> serde_json::Value {
    serde_json::json!({
        "clientContent": {
            "turns": [{
                "role": "user",
                "parts": [{ "text": text }]
            }],
            "turnComplete": true
        }
    })
}

/// Translate one server message into events.
///
/// Audio parts that fail to decode are skipped with a warning; a malformed
/// envelope is an error.
pub fn parse_server_message(raw: &str) -> LlmResult<Vec<LiveEvent>> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| LlmError::ParseError {
        message: format!("invalid live message: {}", e),
    })?;

    let mut events = Vec::new();

    if value.get("setupComplete").is_some() {
        events.push(LiveEvent::Opened);
    }

    if let Some(content) = value.get("serverContent") {
        let parts = content["modelTurn"]["parts"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default();
        for part in parts {
            let inline = &part["inlineData"];
            let Some(data) = inline["data"].as_str() else {
                continue;
            };
            let mime = inline["mimeType"].as_str().unwrap_or("audio/pcm");
            if !mime.starts_with("audio/") {
                continue;
            }
            let rate = sample_rate_from_mime(mime).unwrap_or(BRIEFING_SAMPLE_RATE);
            match decode_pcm16_base64(data, rate) {
                Ok(frame) => events.push(LiveEvent::Audio(frame)),
                Err(err) => tracing::warn!(error = %err, "dropping undecodable audio frame"),
            }
        }
        if content["turnComplete"].as_bool() == Some(true) {
            events.push(LiveEvent::TurnComplete);
        }
    }

    if let Some(error) = value.get("error") {
        let message = error["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        events.push(LiveEvent::Error { message });
    }

    Ok(events)
}

/// Live connector for the Gemini WebSocket API
pub struct GeminiLiveConnector {
    config: ProviderConfig,
}

impl GeminiLiveConnector {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }

    fn session_url(&self, api_key: &str) -> LlmResult<url::Url> {
        let base = self.config.live_url.as_deref().unwrap_or(GEMINI_LIVE_URL);
        let mut url = url::Url::parse(base).map_err(|e| LlmError::InvalidRequest {
            message: format!("invalid live endpoint {}: {}", base, e),
        })?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }
}

#[async_trait]
impl LiveConnector for GeminiLiveConnector {
    async fn connect(&self, setup: LiveSetup) -> LlmResult<LiveConnection> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| missing_api_key_error("gemini-live"))?;
        let url = self.session_url(api_key)?;

        let (ws, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| LlmError::NetworkError {
                message: format!("live session connect failed: {}", e),
            })?;
        let (mut sink, mut stream) = ws.split();

        sink.send(Message::Text(setup_message(&setup).to_string()))
            .await
            .map_err(|e| LlmError::NetworkError {
                message: format!("live session setup failed: {}", e),
            })?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let kickoff = setup.kickoff.clone();

        tokio::spawn(async move {
            let reason = loop {
                let frame = tokio::select! {
                    _ = token.cancelled() => {
                        let _ = sink.send(Message::Close(None)).await;
                        break Some("closed by client".to_string());
                    }
                    frame = stream.next() => frame,
                };

                let text = match frame {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Binary(bytes))) => {
                        String::from_utf8_lossy(&bytes).into_owned()
                    }
                    Some(Ok(Message::Close(close))) => {
                        break close.map(|c| c.reason.to_string());
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = tx
                            .send(LiveEvent::Error {
                                message: e.to_string(),
                            })
                            .await;
                        break None;
                    }
                    None => break None,
                };

                let events = match parse_server_message(&text) {
                    Ok(events) => events,
                    Err(err) => {
                        tracing::warn!(error = %err, "ignoring unparsable live message");
                        continue;
                    }
                };

                for event in events {
                    if event == LiveEvent::Opened {
                        if let Some(prompt) = kickoff.as_deref() {
                            let msg = Message::Text(kickoff_message(prompt).to_string());
                            if let Err(e) = sink.send(msg).await {
                                tracing::warn!(error = %e, "failed to send kickoff turn");
                            }
                        }
                    }
                    if tx.send(event).await.is_err() {
                        // Receiver dropped: nobody is listening any more.
                        token.cancel();
                    }
                }
            };

            tracing::debug!(?reason, "live session ended");
            let _ = tx.send(LiveEvent::Closed { reason }).await;
        });

        Ok(LiveConnection::new(rx, cancel))
    }
}
