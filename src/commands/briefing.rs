//! Voice Briefing Commands

use crate::models::response::CommandResponse;
use crate::services::briefing::{AudioSink, BriefingStats, BriefingToggle};
use crate::state::AppState;
use crate::utils::error::AppResult;

/// Start a briefing over the current alerts, or stop the active one.
pub async fn start_briefing(
    state: &AppState,
    sink: Box<dyn AudioSink>,
) -> CommandResponse<BriefingToggle> {
    toggle(state, sink).await.into()
}

/// Stop the active briefing; `None` when nothing was running.
pub async fn stop_briefing(state: &AppState) -> CommandResponse<Option<BriefingStats>> {
    state.briefing().stop().await.into()
}

async fn toggle(state: &AppState, sink: Box<dyn AudioSink>) -> AppResult<BriefingToggle> {
    let alerts = state.store().read().await.alerts().to_vec();
    state.briefing().toggle(&alerts, sink).await
}
