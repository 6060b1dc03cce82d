//! Satellite Commands

use std::path::Path;

use aegis_command_core::SatelliteReport;

use crate::models::response::CommandResponse;
use crate::services::imagery::load_image;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Classify a satellite image file.
pub async fn analyze_satellite_image(
    state: &AppState,
    path: &Path,
) -> CommandResponse<SatelliteReport> {
    analyze(state, path).await.into()
}

async fn analyze(state: &AppState, path: &Path) -> AppResult<SatelliteReport> {
    let _guard = state
        .satellite_busy()
        .try_acquire()
        .ok_or_else(|| AppError::busy("satellite analysis already in progress"))?;

    let image = load_image(path).await?;
    state
        .intel()
        .analyze_satellite(&image.mime_type, &image.base64_data)
        .await
}
