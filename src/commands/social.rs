//! Social Feed Commands

use aegis_command_core::SocialInsight;

use crate::models::response::CommandResponse;
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Analyze the current posts and replace the stored insight.
pub async fn analyze_social_feed(state: &AppState) -> CommandResponse<SocialInsight> {
    analyze(state).await.into()
}

async fn analyze(state: &AppState) -> AppResult<SocialInsight> {
    let _guard = state
        .social_busy()
        .try_acquire()
        .ok_or_else(|| AppError::busy("social analysis already in progress"))?;

    let posts = state.store().read().await.social_posts().to_vec();
    if posts.is_empty() {
        return Err(AppError::validation(
            "no social posts to analyze; run a sync first",
        ));
    }

    let insight = state.intel().sentiment(&posts).await?;
    state.store().write().await.replace_insight(insight.clone());
    Ok(insight)
}
