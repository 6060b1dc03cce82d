//! Voice Briefing Integration Tests
//!
//! Tests for the briefing session lifecycle against a scripted live
//! connector: toggle semantics, audio delivery and session totals.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use aegis_command::services::briefing::{AudioSink, BriefingToggle};
use aegis_command::{start_briefing, stop_briefing, AppError, AppResult, INCOMPLETE_MESSAGE};
use aegis_command_llm::{AudioFrame, LiveEvent, LlmError};

use crate::support::{
    half_second_frame, state_with, test_config, ScriptedConnector, ScriptedModel,
};

/// Records everything it is asked to play.
#[derive(Clone, Default)]
struct CollectingSink {
    samples: Arc<Mutex<Vec<f32>>>,
    frames: Arc<Mutex<usize>>,
    finished: Arc<Mutex<bool>>,
}

impl CollectingSink {
    fn frames(&self) -> usize {
        *self.frames.lock().unwrap()
    }

    fn finished(&self) -> bool {
        *self.finished.lock().unwrap()
    }
}

impl AudioSink for CollectingSink {
    fn play(&mut self, frame: &AudioFrame) -> AppResult<()> {
        self.samples.lock().unwrap().extend_from_slice(&frame.samples);
        *self.frames.lock().unwrap() += 1;
        Ok(())
    }

    fn finish(&mut self) -> AppResult<()> {
        *self.finished.lock().unwrap() = true;
        Ok(())
    }
}

struct BrokenSink;

impl AudioSink for BrokenSink {
    fn play(&mut self, _frame: &AudioFrame) -> AppResult<()> {
        Err(AppError::internal("output device unplugged"))
    }
}

fn streaming_events(frames: usize) -> Vec<LiveEvent> {
    let mut events = vec![LiveEvent::Opened];
    events.extend((0..frames).map(|_| LiveEvent::Audio(half_second_frame())));
    events.push(LiveEvent::TurnComplete);
    events
}

fn state_for(connector: Arc<ScriptedConnector>) -> aegis_command::AppState {
    state_with(test_config(), Arc::new(ScriptedModel::new()), connector)
}

async fn wait_for_frames(sink: &CollectingSink, count: usize) {
    while sink.frames() < count {
        tokio::task::yield_now().await;
    }
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_toggle_starts_then_stops() {
    let connector = Arc::new(ScriptedConnector::new(streaming_events(1), true));
    let state = state_for(connector.clone());
    let sink = CollectingSink::default();

    let started = start_briefing(&state, Box::new(sink.clone())).await;
    assert_eq!(started.data, Some(BriefingToggle::Started));
    assert!(state.briefing().is_active().await);
    wait_for_frames(&sink, 1).await;

    let stopped = start_briefing(&state, Box::new(CollectingSink::default())).await;
    assert_eq!(stopped.data, Some(BriefingToggle::Stopped));
    assert!(!state.briefing().is_active().await);
    assert!(sink.finished());
    // the toggle-off never opened a second session
    assert_eq!(connector.setups().len(), 1);
}

#[tokio::test]
async fn test_stop_reports_totals() {
    let connector = Arc::new(ScriptedConnector::new(streaming_events(2), true));
    let state = state_for(connector);
    let sink = CollectingSink::default();

    start_briefing(&state, Box::new(sink.clone())).await;
    wait_for_frames(&sink, 2).await;
    let response = stop_briefing(&state).await;

    let stats = response.data.flatten().unwrap();
    assert_eq!(stats.frames, 2);
    assert_eq!(stats.samples, 24_000);
    assert!((stats.audio_seconds - 1.0).abs() < 1e-9);
    assert_eq!(stats.close_reason.as_deref(), Some("closed by client"));
    assert!(stats.error.is_none());
    assert_eq!(sink.samples.lock().unwrap().len(), 24_000);
}

#[tokio::test]
async fn test_stop_without_session() {
    let state = state_for(Arc::new(ScriptedConnector::idle()));

    let response = stop_briefing(&state).await;

    assert!(response.success);
    assert_eq!(response.data, Some(None));
}

#[tokio::test]
async fn test_finish_when_server_closes() {
    let connector = Arc::new(ScriptedConnector::new(streaming_events(3), false));
    let state = state_for(connector);
    let sink = CollectingSink::default();

    start_briefing(&state, Box::new(sink.clone())).await;
    let stats = state
        .briefing()
        .finish(Duration::from_secs(5))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stats.frames, 3);
    assert_eq!(stats.close_reason.as_deref(), Some("server done"));
    assert!(sink.finished());
    assert!(!state.briefing().is_active().await);
}

#[tokio::test(start_paused = true)]
async fn test_finish_enforces_time_limit() {
    let connector = Arc::new(ScriptedConnector::new(streaming_events(1), true));
    let state = state_for(connector);

    start_briefing(&state, Box::new(CollectingSink::default())).await;
    let stats = state
        .briefing()
        .finish(Duration::from_secs(30))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stats.close_reason.as_deref(), Some("closed by client"));
}

// ============================================================================
// Setup & Failure Tests
// ============================================================================

#[tokio::test]
async fn test_setup_summarizes_current_alerts() {
    let connector = Arc::new(ScriptedConnector::new(Vec::new(), false));
    let state = state_for(connector.clone());

    start_briefing(&state, Box::new(CollectingSink::default())).await;

    let setup = connector.setups().remove(0);
    assert_eq!(setup.model, state.config().live_model);
    assert_eq!(setup.voice, "Charon");
    assert_eq!(setup.kickoff.as_deref(), Some("Begin the briefing."));
    assert!(setup
        .system_instruction
        .contains("Wildfire Risk at Ventura County, California. Severity: Critical."));
    assert!(setup
        .system_instruction
        .contains("Seismic Anomaly at Ishikawa Prefecture, Japan. Severity: High."));
    assert!(setup.system_instruction.ends_with("End the briefing with \"End of report.\""));
}

#[tokio::test]
async fn test_connect_failure_is_reported() {
    let connector = Arc::new(ScriptedConnector::failing(LlmError::ProviderUnavailable {
        message: "handshake refused".to_string(),
    }));
    let state = state_for(connector.clone());

    let first = start_briefing(&state, Box::new(CollectingSink::default())).await;
    assert!(!first.success);
    assert_eq!(first.error.as_deref(), Some(INCOMPLETE_MESSAGE));
    assert!(!state.briefing().is_active().await);
    assert!(!state.briefing().is_connecting());

    // a failed attempt does not block the next one
    let second = start_briefing(&state, Box::new(CollectingSink::default())).await;
    assert!(!second.success);
    assert_eq!(connector.setups().len(), 2);
}

#[tokio::test]
async fn test_sink_failure_ends_session() {
    let connector = Arc::new(ScriptedConnector::new(streaming_events(2), true));
    let state = state_for(connector);

    start_briefing(&state, Box::new(BrokenSink)).await;
    let stats = state
        .briefing()
        .finish(Duration::from_secs(5))
        .await
        .unwrap()
        .unwrap();

    assert!(stats
        .error
        .as_deref()
        .unwrap()
        .contains("output device unplugged"));
    assert_eq!(stats.close_reason.as_deref(), Some("closed by client"));
}
