//! Command Integration Tests
//!
//! Tests for the on-demand commands: logistics, prevention, satellite and
//! social analysis, including target selection and busy handling.

use std::sync::Arc;

use aegis_command::commands::select_response_target;
use aegis_command::services::store::IncidentStore;
use aegis_command::{
    analyze_satellite_image, analyze_social_feed, generate_logistics_plan,
    generate_prevention_strategy, get_dashboard, trigger_sync, AppError,
};
use aegis_command_core::{DisasterCategory, Priority, Severity};

use crate::support::{rate_limited, test_state, ScriptedModel, PREDICTIONS_JSON};

const PLAN_JSON: &str = r#"{
    "safeZones": [{"name": "Fairgrounds", "capacity": "2,000", "status": "Open"}],
    "hospitals": [{"name": "Ventura General", "traumaLevel": "II", "distance": "4 mi"}],
    "resourceNeeds": ["Water tenders", "N95 masks"],
    "tacticalAdvice": "Hold the eastern line."
}"#;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

// ============================================================================
// Logistics Tests
// ============================================================================

#[tokio::test]
async fn test_logistics_defaults_to_first_live_alert() {
    let model = Arc::new(ScriptedModel::new().structured(PLAN_JSON));
    let state = test_state(model.clone());

    let response = generate_logistics_plan(&state, None).await;

    assert!(response.success, "{:?}", response.error);
    let report = response.data.unwrap();
    assert_eq!(report.alert.id, "sample-1");
    assert_eq!(report.plan.safe_zones[0].name, "Fairgrounds");
    assert_eq!(report.plan.medical_facilities[0].trauma_level, "II");
    assert_eq!(report.plan.resource_needs.len(), 2);
    assert_eq!(report.plan.tactical_advice, "Hold the eastern line.");
    assert!(model.prompts()[0].contains("for a Wildfire Risk in Ventura County, California"));
}

#[tokio::test]
async fn test_logistics_for_explicit_alert() {
    let model = Arc::new(ScriptedModel::new().structured("{}"));
    let state = test_state(model.clone());

    let response = generate_logistics_plan(&state, Some("sample-2")).await;

    let report = response.data.unwrap();
    assert_eq!(report.alert.location, "Ishikawa Prefecture, Japan");
    assert!(report.plan.safe_zones.is_empty());
    assert!(report.plan.tactical_advice.is_empty());
}

#[tokio::test]
async fn test_logistics_rejects_forecast() {
    let model = Arc::new(ScriptedModel::new().sync_round(PREDICTIONS_JSON));
    let state = test_state(model.clone());
    trigger_sync(&state).await;
    let forecast_id = {
        let store = state.store().read().await;
        store
            .alerts()
            .iter()
            .find(|a| a.is_prediction)
            .map(|a| a.id.clone())
            .unwrap()
    };
    let calls_before = model.calls();

    let response = generate_logistics_plan(&state, Some(&forecast_id)).await;

    assert!(!response.success);
    assert!(response.error.unwrap().contains("forecast"));
    assert_eq!(model.calls(), calls_before);
}

#[tokio::test]
async fn test_logistics_unknown_alert() {
    let state = test_state(Arc::new(ScriptedModel::new()));

    let err = select_response_target(&state, Some("missing")).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_logistics_without_live_alerts() {
    let state = test_state(Arc::new(ScriptedModel::new()));
    {
        let mut store = state.store().write().await;
        *store = IncidentStore::new(15);
        store.append_predictions(aegis_command::services::normalizer::normalize_predictions(
            PREDICTIONS_JSON,
        ));
    }

    let err = select_response_target(&state, None).await.unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_logistics_busy_rejected() {
    let model = Arc::new(ScriptedModel::new().structured(PLAN_JSON));
    let state = test_state(model.clone());

    let guard = state.logistics_busy().try_acquire().unwrap();
    let response = generate_logistics_plan(&state, None).await;
    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("Busy"));
    assert_eq!(model.calls(), 0);

    drop(guard);
    assert!(generate_logistics_plan(&state, None).await.success);
}

// ============================================================================
// Prevention Tests
// ============================================================================

#[tokio::test]
async fn test_prevention_defaults() {
    let model = Arc::new(ScriptedModel::new().structured(
        r#"{
            "blueprintName": "Ember Shield",
            "readinessScore": 140,
            "checklist": [
                {"task": "Clear brush", "priority": "High"},
                {"task": "Stage pumps", "priority": "urgent"},
                {"task": "", "priority": "Low"}
            ],
            "mitigationSteps": ["Create firebreaks"],
            "evacuationProtocols": ["Notify residents"]
        }"#,
    ));
    let state = test_state(model.clone());

    let response = generate_prevention_strategy(&state, None, None).await;

    let strategy = response.data.unwrap();
    assert_eq!(strategy.name, "Ember Shield");
    assert_eq!(strategy.readiness_score, 100.0);
    assert_eq!(strategy.checklist.len(), 2);
    assert_eq!(strategy.checklist[0].priority, Priority::High);
    assert_eq!(strategy.checklist[1].priority, Priority::Medium);
    assert_eq!(strategy.evacuation_steps, vec!["Notify residents"]);
    assert!(model.prompts()[0].contains("Wildfire scenario in Regional Perimeter"));
}

#[tokio::test]
async fn test_prevention_custom_target() {
    let model = Arc::new(ScriptedModel::new().structured("{}"));
    let state = test_state(model.clone());

    let response =
        generate_prevention_strategy(&state, Some("Flood"), Some("Rhine Delta")).await;

    assert!(response.success);
    assert!(model.prompts()[0].contains("Flood scenario in Rhine Delta"));
}

#[tokio::test(start_paused = true)]
async fn test_prevention_throttled() {
    let model = Arc::new(
        ScriptedModel::new()
            .structured_err(rate_limited())
            .structured_err(rate_limited())
            .structured_err(rate_limited()),
    );
    let state = test_state(model);

    let response = generate_prevention_strategy(&state, None, None).await;

    assert!(!response.success);
    assert!(response.throttled);
    assert!(response.data.is_none());
}

// ============================================================================
// Satellite Tests
// ============================================================================

#[tokio::test]
async fn test_satellite_classifies_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.png");
    std::fs::write(&path, PNG_MAGIC).unwrap();
    let model = Arc::new(ScriptedModel::new().structured(
        r#"{"disasterType": "Flood", "riskLevel": "Critical", "confidence": 1.4,
            "detectedAnomalies": ["Inundated farmland"], "summary": "River breach."}"#,
    ));
    let state = test_state(model.clone());

    let response = analyze_satellite_image(&state, &path).await;

    let report = response.data.unwrap();
    assert_eq!(report.category, DisasterCategory::Flood);
    assert_eq!(report.severity, Severity::Critical);
    assert_eq!(report.confidence, 1.0);
    assert_eq!(report.anomalies, vec!["Inundated farmland".to_string()]);
    let prompts = model.prompts();
    assert_eq!(prompts[0], "<image/png>");
    assert!(prompts[1].starts_with("Analyze this satellite image"));
}

#[tokio::test]
async fn test_satellite_unknown_category_is_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("capture.png");
    std::fs::write(&path, PNG_MAGIC).unwrap();
    let model = Arc::new(ScriptedModel::new().structured(r#"{"disasterType": "Volcano"}"#));
    let state = test_state(model);

    let report = analyze_satellite_image(&state, &path).await.data.unwrap();

    assert_eq!(report.category, DisasterCategory::None);
    assert_eq!(report.category.label(), "Normal/Baseline");
    assert_eq!(report.severity, Severity::Low);
}

#[tokio::test]
async fn test_satellite_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let model = Arc::new(ScriptedModel::new());
    let state = test_state(model.clone());

    let response = analyze_satellite_image(&state, &dir.path().join("absent.png")).await;

    assert!(!response.success);
    assert!(!response.throttled);
    assert_eq!(model.calls(), 0);
}

// ============================================================================
// Social Tests
// ============================================================================

#[tokio::test]
async fn test_social_requires_posts() {
    let model = Arc::new(ScriptedModel::new());
    let state = test_state(model.clone());

    let response = analyze_social_feed(&state).await;

    assert!(!response.success);
    assert!(response.error.unwrap().contains("run a sync first"));
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_social_analysis_after_sync() {
    let model = Arc::new(
        ScriptedModel::new().sync_round("[]").structured(
            r#"{"postCount": 2, "sentimentScore": -1.7, "trendingKeywords": ["smoke", "sirens"],
                "alertTriggered": true, "rawTextAnalysis": "Rising alarm."}"#,
        ),
    );
    let state = test_state(model.clone());
    assert!(trigger_sync(&state).await.success);

    let response = analyze_social_feed(&state).await;

    let insight = response.data.unwrap();
    assert_eq!(insight.post_count, 2);
    assert_eq!(insight.sentiment_score, -1.0);
    assert!(insight.elevated_concern);
    assert_eq!(insight.trending_keywords, vec!["smoke", "sirens"]);
    assert_eq!(
        model.prompts().last().unwrap(),
        "Analyze these posts: Smoke visible from the harbor\nEvacuation sirens on Main St"
    );

    let view = get_dashboard(&state).await.data.unwrap();
    assert_eq!(view.insight, Some(insight));
}
