//! Aegis Command - Disaster Intel Backend
//!
//! This library provides the backend behind the Aegis Command dashboard.
//! It includes:
//! - Command handlers returning `CommandResponse` envelopes
//! - Business logic services (sync, normalization, briefing)
//! - Configuration storage
//! - Data models and utilities

pub mod commands;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

// Re-export commonly used items from commands
pub use commands::{
    analyze_satellite_image, analyze_social_feed, generate_logistics_plan,
    generate_prevention_strategy, get_dashboard, start_briefing, stop_briefing, trigger_sync,
};
pub use models::response::*;
pub use models::settings::{AppConfig, SettingsUpdate};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
