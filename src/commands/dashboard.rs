//! Dashboard Commands
//!
//! The main sync and the read-only dashboard view.

use crate::models::response::{CommandResponse, DashboardView};
use crate::services::sync::SyncOutcome;
use crate::state::AppState;

/// Run the live-incident → chatter → predictions sync.
///
/// A request made while a sync is outstanding succeeds with
/// `SyncOutcome::Skipped` and changes nothing.
pub async fn trigger_sync(state: &AppState) -> CommandResponse<SyncOutcome> {
    state.sync().trigger(state.location()).await.into()
}

/// Get the current working set and banner state
pub async fn get_dashboard(state: &AppState) -> CommandResponse<DashboardView> {
    CommandResponse::ok(state.dashboard().await)
}
