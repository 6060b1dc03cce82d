//! Aegis Command Core
//!
//! Foundational types for the Aegis Command workspace: the error taxonomy,
//! outbound proxy settings and the disaster-intel records every other crate
//! produces or consumes. Nothing here performs I/O.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `proxy` - Proxy configuration shared by HTTP-using crates
//! - `records` - Alerts, social posts/insight, satellite, logistics and prevention records

pub mod error;
pub mod proxy;
pub mod records;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};

// ── Records ────────────────────────────────────────────────────────────
pub use records::{
    Alert, AlertSource, ChecklistItem, Coordinates, DisasterCategory, LogisticsPlan,
    MedicalFacility, PreventionStrategy, Priority, SafeZone, SatelliteReport, Severity,
    SocialInsight, SocialPost, SAMPLE_ID_PREFIX,
};
