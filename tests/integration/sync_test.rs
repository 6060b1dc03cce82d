//! System Sync Integration Tests
//!
//! Tests for the live incident → chatter → predictions sync and how its
//! results land in the incident store.

use std::sync::Arc;

use tokio::sync::Notify;

use aegis_command::services::sync::SyncOutcome;
use aegis_command::{get_dashboard, trigger_sync, AppConfig, INCOMPLETE_MESSAGE};
use aegis_command_core::{Coordinates, Severity};
use aegis_command_llm::LlmError;

use crate::support::{
    rate_limited, state_with, test_config, test_state, ScriptedConnector, ScriptedModel,
    PREDICTIONS_JSON,
};

// ============================================================================
// Merge Tests
// ============================================================================

#[tokio::test]
async fn test_sync_replaces_samples() {
    let model = Arc::new(ScriptedModel::new().sync_round(PREDICTIONS_JSON));
    let state = test_state(model.clone());
    assert_eq!(state.summary().await.total_alerts, 3);

    let response = trigger_sync(&state).await;
    assert!(response.success, "{:?}", response.error);
    match response.data {
        Some(SyncOutcome::Completed {
            incident,
            social_posts,
            predictions,
        }) => {
            assert_eq!(incident.category, "Wildfire");
            assert_eq!(incident.location, "Ventura County");
            assert_eq!(incident.severity, Severity::Critical);
            assert_eq!(social_posts, 2);
            assert_eq!(predictions, 2);
        }
        other => panic!("Expected Completed, got {:?}", other),
    }

    let view = get_dashboard(&state).await.data.unwrap();
    assert_eq!(view.alerts.len(), 3);
    assert!(view.alerts.iter().all(|a| !a.is_placeholder()));
    assert!(view.alerts[0].is_live);
    assert!(view.alerts[1..].iter().all(|a| a.is_prediction && !a.is_live));
    assert_eq!(view.social_posts.len(), 2);
    assert_eq!(view.social_posts[0].author, "@coastwatch");
    assert_eq!(view.summary.live_count, 1);
    assert!(!view.throttled);
    assert!(!view.syncing);
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn test_chatter_prompt_uses_incident_summary() {
    let model = Arc::new(ScriptedModel::new().sync_round("[]"));
    let state = test_state(model.clone());

    trigger_sync(&state).await;

    let prompts = model.prompts();
    assert!(prompts[1].contains("Fire front advancing on the eastern perimeter."));
}

#[tokio::test]
async fn test_caller_location_biases_search() {
    let model = Arc::new(ScriptedModel::new().sync_round("[]"));
    let mut state = test_state(model.clone());
    state
        .set_location(Some(Coordinates::new(34.2, -119.2)))
        .unwrap();

    trigger_sync(&state).await;

    assert!(model.prompts()[0].contains("near 34.2, -119.2"));
}

#[tokio::test]
async fn test_invalid_location_rejected() {
    let mut state = test_state(Arc::new(ScriptedModel::new()));
    assert!(state
        .set_location(Some(Coordinates::new(123.0, 0.0)))
        .is_err());
    assert!(state.location().is_none());
}

#[tokio::test]
async fn test_previous_predictions_evicted_by_next_incident() {
    let model = Arc::new(
        ScriptedModel::new()
            .sync_round(PREDICTIONS_JSON)
            .sync_round(r#"[{"type": "Drought", "location": "Sahel"}]"#),
    );
    let state = test_state(model);

    trigger_sync(&state).await;
    trigger_sync(&state).await;

    let store = state.store().read().await;
    let alerts = store.alerts();
    assert_eq!(alerts.len(), 3);
    assert!(alerts[0].is_live && alerts[1].is_live);
    assert_ne!(alerts[0].id, alerts[1].id);
    assert_eq!(alerts[2].category, "Drought");
}

#[tokio::test]
async fn test_live_incidents_capped_at_capacity() {
    let config = AppConfig {
        alert_capacity: 2,
        ..test_config()
    };
    let model = Arc::new(
        ScriptedModel::new()
            .sync_round("[]")
            .sync_round("[]")
            .sync_round("[]"),
    );
    let state = state_with(config, model, Arc::new(ScriptedConnector::idle()));

    for _ in 0..3 {
        assert!(trigger_sync(&state).await.success);
    }

    assert_eq!(state.summary().await.total_alerts, 2);
}

#[tokio::test]
async fn test_duplicate_predictions_kept_by_default() {
    let duplicated = r#"[
        {"type": "Flood", "location": "Rhine Delta"},
        {"type": "flood", "location": "rhine delta "}
    ]"#;
    let model = Arc::new(ScriptedModel::new().sync_round(duplicated));
    let state = test_state(model);

    trigger_sync(&state).await;

    let store = state.store().read().await;
    assert_eq!(store.alerts().iter().filter(|a| a.is_prediction).count(), 2);
}

#[tokio::test]
async fn test_dedupe_mode_collapses_predictions() {
    let duplicated = r#"[
        {"type": "Flood", "location": "Rhine Delta"},
        {"type": "flood", "location": "rhine delta "}
    ]"#;
    let config = AppConfig {
        dedupe_predictions: true,
        ..test_config()
    };
    let model = Arc::new(ScriptedModel::new().sync_round(duplicated));
    let state = state_with(config, model, Arc::new(ScriptedConnector::idle()));

    trigger_sync(&state).await;

    let store = state.store().read().await;
    assert_eq!(store.alerts().iter().filter(|a| a.is_prediction).count(), 1);
}

#[tokio::test]
async fn test_malformed_payloads_still_complete() {
    let model = Arc::new(
        ScriptedModel::new()
            .grounded("no structured fields at all")
            .structured("not json")
            .structured("```json\n{\"unexpected\": true}\n```"),
    );
    let state = test_state(model);

    let response = trigger_sync(&state).await;
    assert!(response.success);

    let view = get_dashboard(&state).await.data.unwrap();
    assert_eq!(view.alerts.len(), 1);
    assert_eq!(view.alerts[0].category, "Regional Event");
    assert_eq!(view.alerts[0].location, "Sector Alpha");
    assert_eq!(view.alerts[0].severity, Severity::High);
    assert!(view.social_posts.is_empty());
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_failed_step_leaves_store_unchanged() {
    let model = Arc::new(
        ScriptedModel::new()
            .grounded(crate::support::INCIDENT_TEXT)
            .structured(crate::support::SOCIAL_JSON)
            .structured_err(LlmError::ServerError {
                message: "internal".to_string(),
                status: Some(500),
            }),
    );
    let state = test_state(model.clone());
    let before = state.store().read().await.alerts().to_vec();

    let response = trigger_sync(&state).await;

    assert!(!response.success);
    assert!(!response.throttled);
    // server detail stays out of the envelope
    assert_eq!(response.error.as_deref(), Some(INCOMPLETE_MESSAGE));
    let store = state.store().read().await;
    assert_eq!(store.alerts(), before.as_slice());
    assert!(store.social_posts().is_empty());
    // terminal failures are not retried
    assert_eq!(model.calls(), 3);
    assert!(!state.sync().is_syncing());
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_exhaustion_sets_throttled() {
    let model = Arc::new(
        ScriptedModel::new()
            .grounded_err(rate_limited())
            .grounded_err(rate_limited())
            .grounded_err(rate_limited()),
    );
    let state = test_state(model.clone());

    let response = trigger_sync(&state).await;

    assert!(!response.success);
    assert!(response.throttled);
    assert!(state.sync().is_throttled());
    assert!(get_dashboard(&state).await.data.unwrap().throttled);
    // one call plus two retries
    assert_eq!(model.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_next_sync_clears_throttled() {
    let model = Arc::new(
        ScriptedModel::new()
            .grounded_err(rate_limited())
            .grounded_err(rate_limited())
            .grounded_err(rate_limited())
            .sync_round("[]"),
    );
    let state = test_state(model);

    assert!(trigger_sync(&state).await.throttled);
    assert!(trigger_sync(&state).await.success);
    assert!(!state.sync().is_throttled());
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_recovers_within_budget() {
    let model = Arc::new(
        ScriptedModel::new()
            .grounded_err(rate_limited())
            .sync_round("[]"),
    );
    let state = test_state(model.clone());

    let response = trigger_sync(&state).await;

    assert!(response.success);
    assert_eq!(model.calls(), 4);
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test]
async fn test_sync_while_in_flight_is_skipped() {
    let gate = Arc::new(Notify::new());
    let model = Arc::new(
        ScriptedModel::new()
            .sync_round(PREDICTIONS_JSON)
            .gated(gate.clone()),
    );
    let state = Arc::new(test_state(model.clone()));

    let first = tokio::spawn({
        let state = Arc::clone(&state);
        async move { trigger_sync(&state).await }
    });
    while model.calls() == 0 {
        tokio::task::yield_now().await;
    }
    assert!(state.sync().is_syncing());

    let second = trigger_sync(&state).await;
    assert!(second.success);
    assert_eq!(second.data, Some(SyncOutcome::Skipped));
    assert_eq!(model.calls(), 1);

    gate.notify_one();
    let first = first.await.unwrap();
    assert!(matches!(first.data, Some(SyncOutcome::Completed { .. })));
    assert_eq!(model.calls(), 3);
    assert!(!state.sync().is_syncing());
}
