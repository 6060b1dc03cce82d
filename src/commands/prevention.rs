//! Prevention Commands

use aegis_command_core::PreventionStrategy;

use crate::models::response::CommandResponse;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Generate a prevention blueprint; blank arguments use the defaults.
pub async fn generate_prevention_strategy(
    state: &AppState,
    target: Option<&str>,
    location: Option<&str>,
) -> CommandResponse<PreventionStrategy> {
    generate(state, target, location).await.into()
}

async fn generate(
    state: &AppState,
    target: Option<&str>,
    location: Option<&str>,
) -> AppResult<PreventionStrategy> {
    let _guard = state
        .prevention_busy()
        .try_acquire()
        .ok_or_else(|| AppError::busy("prevention synthesis already in progress"))?;
    state.intel().prevention_strategy(target, location).await
}
