//! Voice Briefing
//!
//! Opens a live audio session whose system instruction summarizes the current
//! alerts, and pumps every decoded frame into an `AudioSink` as it arrives.
//! Starting while a briefing is active ends it instead.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use aegis_command_core::Alert;
use aegis_command_llm::{AudioFrame, LiveConnection, LiveConnector, LiveEvent, LiveSetup};

use crate::services::busy::BusyFlag;
use crate::services::prompts;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::ensure_parent_dir;

/// Destination for decoded briefing audio.
pub trait AudioSink: Send {
    fn play(&mut self, frame: &AudioFrame) -> AppResult<()>;

    /// Called once after the session ends.
    fn finish(&mut self) -> AppResult<()> {
        Ok(())
    }
}

/// Writes raw little-endian 16-bit mono PCM to a file.
pub struct PcmFileSink {
    writer: BufWriter<File>,
}

impl PcmFileSink {
    pub fn create(path: &Path) -> AppResult<Self> {
        ensure_parent_dir(path)?;
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl AudioSink for PcmFileSink {
    fn play(&mut self, frame: &AudioFrame) -> AppResult<()> {
        self.writer.write_all(&frame.to_pcm16_le())?;
        Ok(())
    }

    fn finish(&mut self) -> AppResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// What a start request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BriefingToggle {
    Started,
    Stopped,
}

/// Totals for a finished session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BriefingStats {
    pub frames: usize,
    pub samples: usize,
    pub audio_seconds: f64,
    pub close_reason: Option<String>,
    pub error: Option<String>,
}

struct ActiveBriefing {
    closer: CancellationToken,
    task: JoinHandle<BriefingStats>,
}

pub struct BriefingService {
    connector: Arc<dyn LiveConnector>,
    live_model: String,
    voice: String,
    connecting: BusyFlag,
    active: Mutex<Option<ActiveBriefing>>,
}

impl BriefingService {
    pub fn new(
        connector: Arc<dyn LiveConnector>,
        live_model: impl Into<String>,
        voice: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            live_model: live_model.into(),
            voice: voice.into(),
            connecting: BusyFlag::new(),
            active: Mutex::new(None),
        }
    }

    pub fn setup_for(&self, alerts: &[Alert]) -> LiveSetup {
        LiveSetup {
            model: self.live_model.clone(),
            voice: self.voice.clone(),
            system_instruction: prompts::briefing_instruction(alerts),
            kickoff: Some(prompts::BRIEFING_KICKOFF.to_string()),
        }
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting.is_busy()
    }

    pub async fn is_active(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|b| !b.task.is_finished())
    }

    /// Start a briefing, or stop the running one.
    pub async fn toggle(
        &self,
        alerts: &[Alert],
        sink: Box<dyn AudioSink>,
    ) -> AppResult<BriefingToggle> {
        if self.is_active().await {
            self.stop().await?;
            return Ok(BriefingToggle::Stopped);
        }
        self.start(alerts, sink).await?;
        Ok(BriefingToggle::Started)
    }

    /// Open a session and begin streaming into `sink`.
    pub async fn start(&self, alerts: &[Alert], sink: Box<dyn AudioSink>) -> AppResult<()> {
        let _guard = self
            .connecting
            .try_acquire()
            .ok_or_else(|| AppError::busy("briefing link is already being established"))?;

        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|b| !b.task.is_finished()) {
            return Err(AppError::busy("a briefing is already active"));
        }

        let setup = self.setup_for(alerts);
        tracing::info!(
            model = %setup.model,
            voice = %setup.voice,
            alerts = alerts.len(),
            "opening briefing link"
        );
        let connection = self.connector.connect(setup).await?;
        let closer = connection.closer();
        let task = tokio::spawn(pump(connection, sink));

        *active = Some(ActiveBriefing { closer, task });
        Ok(())
    }

    /// End the active briefing, if any, and return its totals.
    pub async fn stop(&self) -> AppResult<Option<BriefingStats>> {
        let Some(briefing) = self.active.lock().await.take() else {
            return Ok(None);
        };
        briefing.closer.cancel();
        let stats = briefing
            .task
            .await
            .map_err(|e| AppError::internal(format!("briefing task failed: {}", e)))?;
        Ok(Some(stats))
    }

    /// Wait for the active briefing to end on its own, stopping it once
    /// `limit` elapses.
    pub async fn finish(&self, limit: Duration) -> AppResult<Option<BriefingStats>> {
        let Some(mut briefing) = self.active.lock().await.take() else {
            return Ok(None);
        };
        let joined = match tokio::time::timeout(limit, &mut briefing.task).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::info!(limit_secs = limit.as_secs(), "briefing time limit reached");
                briefing.closer.cancel();
                briefing.task.await
            }
        };
        joined
            .map(Some)
            .map_err(|e| AppError::internal(format!("briefing task failed: {}", e)))
    }
}

async fn pump(mut connection: LiveConnection, mut sink: Box<dyn AudioSink>) -> BriefingStats {
    let mut stats = BriefingStats::default();

    while let Some(event) = connection.next_event().await {
        match event {
            LiveEvent::Opened => tracing::info!("briefing link established"),
            LiveEvent::Audio(frame) => {
                stats.frames += 1;
                stats.samples += frame.samples.len();
                stats.audio_seconds += frame.duration().as_secs_f64();
                if let Err(err) = sink.play(&frame) {
                    tracing::warn!(error = %err, "audio sink rejected frame, closing briefing");
                    stats.error = Some(err.to_string());
                    connection.close();
                }
            }
            LiveEvent::TurnComplete => tracing::debug!("briefing turn complete"),
            LiveEvent::Error { message } => {
                tracing::warn!(%message, "briefing link error");
                stats.error = Some(message);
            }
            LiveEvent::Closed { reason } => {
                stats.close_reason = reason;
                break;
            }
        }
    }

    if let Err(err) = sink.finish() {
        tracing::warn!(error = %err, "failed to finalize audio sink");
    }
    tracing::info!(frames = stats.frames, seconds = stats.audio_seconds, "briefing ended");
    stats
}
