//! Response Types
//!
//! Standard envelope returned by every command, plus the read-only dashboard
//! views.

use serde::{Deserialize, Serialize};

use aegis_command_core::{Alert, Severity, SocialInsight, SocialPost};

use crate::utils::error::AppError;

/// Error text for failures whose detail is only logged
pub const INCOMPLETE_MESSAGE: &str = "The operation did not complete. See the logs for details.";

/// Error text for rate-limit exhaustion
pub const THROTTLED_MESSAGE: &str = "Rate limit reached. Try again shortly.";

/// Generic command response for all commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Set when the failure was rate-limit exhaustion
    #[serde(default)]
    pub throttled: bool,
}

impl<T> CommandResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            throttled: false,
        }
    }

    /// Create an error response with message
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            throttled: false,
        }
    }

    /// Create an error response for a rate-limited failure
    pub fn throttled(message: impl Into<String>) -> Self {
        Self {
            throttled: true,
            ..Self::err(message)
        }
    }
}

impl<T> From<Result<T, AppError>> for CommandResponse<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) if e.is_throttled() => {
                tracing::warn!(error = %e, "command throttled");
                Self::throttled(THROTTLED_MESSAGE)
            }
            Err(e) if e.is_user_facing() => Self::err(e.to_string()),
            Err(e) => {
                tracing::error!(error = %e, "command did not complete");
                Self::err(INCOMPLETE_MESSAGE)
            }
        }
    }
}

/// Counts the dashboard header and navigation badge display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_alerts: usize,
    pub live_count: usize,
    pub critical_count: usize,
    pub any_live: bool,
}

impl DashboardSummary {
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let live_count = alerts.iter().filter(|a| a.is_live).count();
        Self {
            total_alerts: alerts.len(),
            live_count,
            critical_count: alerts
                .iter()
                .filter(|a| a.severity == Severity::Critical)
                .count(),
            any_live: live_count > 0,
        }
    }
}

/// Snapshot of the working set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub summary: DashboardSummary,
    pub alerts: Vec<Alert>,
    pub social_posts: Vec<SocialPost>,
    pub insight: Option<SocialInsight>,
    pub throttled: bool,
    pub syncing: bool,
}
