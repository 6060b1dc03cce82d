//! Logistics Commands
//!
//! Response plans are generated for confirmed incidents only; forecasts are
//! not valid targets.

use serde::{Deserialize, Serialize};

use aegis_command_core::{Alert, LogisticsPlan};

use crate::models::response::CommandResponse;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// A plan together with the alert it was generated for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticsReport {
    pub alert: Alert,
    pub plan: LogisticsPlan,
}

/// Generate a response plan for `alert_id`, or for the first live alert.
pub async fn generate_logistics_plan(
    state: &AppState,
    alert_id: Option<&str>,
) -> CommandResponse<LogisticsReport> {
    generate(state, alert_id).await.into()
}

/// Resolve the alert a plan should target.
pub async fn select_response_target(state: &AppState, alert_id: Option<&str>) -> AppResult<Alert> {
    let store = state.store().read().await;
    match alert_id {
        Some(id) => {
            let alert = store
                .find_alert(id)
                .ok_or_else(|| AppError::not_found(format!("alert {}", id)))?;
            if alert.is_prediction {
                return Err(AppError::validation(format!(
                    "alert {} is a forecast; plans need a confirmed incident",
                    id
                )));
            }
            Ok(alert.clone())
        }
        None => store
            .response_targets()
            .find(|a| a.is_live)
            .cloned()
            .ok_or_else(|| AppError::not_found("no live alert to plan for")),
    }
}

async fn generate(state: &AppState, alert_id: Option<&str>) -> AppResult<LogisticsReport> {
    let _guard = state
        .logistics_busy()
        .try_acquire()
        .ok_or_else(|| AppError::busy("logistics synthesis already in progress"))?;

    let alert = select_response_target(state, alert_id).await?;
    let plan = state.intel().logistics_plan(&alert).await?;
    Ok(LogisticsReport { alert, plan })
}
