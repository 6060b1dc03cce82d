//! Disaster Intel Records
//!
//! The fixed record shapes the dashboard renders. Every record is produced by
//! normalizing a remote model response and lives only in process memory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Id prefix carried by the placeholder alerts the dashboard boots with.
pub const SAMPLE_ID_PREFIX: &str = "sample";

/// Ordinal risk classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }

    /// Case-insensitive match against the four level names.
    ///
    /// Model output is not trusted to use the exact casing, and occasionally
    /// pads the value (`" high "`), so the input is trimmed first.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" | "moderate" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s).ok_or_else(|| CoreError::parse(format!("unknown severity: {s}")))
    }
}

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const ORIGIN: Coordinates = Coordinates { lat: 0.0, lng: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both axes are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A web source backing a live alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSource {
    pub uri: String,
    pub title: String,
}

/// A disaster-related record: either a live observation or a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    /// Display time ("HH:MM" for live alerts, "PREDICTED" for forecasts)
    pub time: String,
    /// Free-text disaster type
    #[serde(rename = "type")]
    pub category: String,
    pub location: String,
    pub severity: Severity,
    pub summary: String,
    pub is_live: bool,
    #[serde(default)]
    pub is_prediction: bool,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<AlertSource>,
}

impl Alert {
    /// Whether this is one of the boot-time sample alerts.
    pub fn is_placeholder(&self) -> bool {
        self.id.starts_with(SAMPLE_ID_PREFIX)
    }
}

/// A single synthesized social-media post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: String,
    pub author: String,
    pub text: String,
    pub time_label: String,
    /// Transient highlight only; carries no merge semantics.
    #[serde(default)]
    pub is_new: bool,
}

/// Aggregate sentiment over a batch of posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialInsight {
    pub post_count: u32,
    /// Signed score, clamped to -1.0..=1.0
    pub sentiment_score: f64,
    pub trending_keywords: Vec<String>,
    pub elevated_concern: bool,
    pub rationale: String,
}

/// Closed set of categories a satellite image can be classified into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisasterCategory {
    Wildfire,
    Flood,
    Earthquake,
    Hurricane,
    #[default]
    None,
}

impl DisasterCategory {
    pub fn label(&self) -> &'static str {
        match self {
            DisasterCategory::Wildfire => "Wildfire",
            DisasterCategory::Flood => "Flood",
            DisasterCategory::Earthquake => "Earthquake",
            DisasterCategory::Hurricane => "Hurricane",
            DisasterCategory::None => "Normal/Baseline",
        }
    }

    /// Anything outside the closed set collapses to `None`.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "wildfire" | "fire" => DisasterCategory::Wildfire,
            "flood" | "flooding" => DisasterCategory::Flood,
            "earthquake" | "seismic" => DisasterCategory::Earthquake,
            "hurricane" | "cyclone" | "typhoon" => DisasterCategory::Hurricane,
            _ => DisasterCategory::None,
        }
    }
}

impl fmt::Display for DisasterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classification of a single satellite image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SatelliteReport {
    pub category: DisasterCategory,
    pub severity: Severity,
    /// Clamped to 0.0..=1.0
    pub confidence: f64,
    pub anomalies: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeZone {
    pub name: String,
    pub capacity: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalFacility {
    pub name: String,
    pub trauma_level: String,
    pub distance: String,
}

/// Per-incident response artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogisticsPlan {
    pub safe_zones: Vec<SafeZone>,
    pub medical_facilities: Vec<MedicalFacility>,
    pub resource_needs: Vec<String>,
    pub tactical_advice: String,
}

/// Checklist priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub task: String,
    pub priority: Priority,
}

/// Proactive mitigation blueprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreventionStrategy {
    pub name: String,
    /// Percentage, clamped to 0.0..=100.0
    pub readiness_score: f64,
    pub checklist: Vec<ChecklistItem>,
    pub mitigation_steps: Vec<String>,
    pub evacuation_steps: Vec<String>,
}
