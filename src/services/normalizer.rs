//! Response Normalizer
//!
//! Turns loosely structured model output into fully populated records.
//! Nothing here fails: malformed payloads and missing fields fall back to
//! defaults, and the fallback is logged rather than surfaced.

use std::sync::OnceLock;

use chrono::Local;
use regex::Regex;
use serde_json::{Map, Value};

use aegis_command_core::{
    Alert, AlertSource, ChecklistItem, Coordinates, DisasterCategory, LogisticsPlan,
    MedicalFacility, PreventionStrategy, Priority, SafeZone, SatelliteReport, Severity,
    SocialInsight, SocialPost,
};
use aegis_command_llm::GroundingCitation;

/// Category used when a live report carries no `Type:` marker.
pub const FALLBACK_CATEGORY: &str = "Regional Event";

/// Location used when a live report carries no `Location:` marker.
pub const FALLBACK_LOCATION: &str = "Sector Alpha";

/// Display time carried by every forecast.
pub const PREDICTED_TIME_LABEL: &str = "PREDICTED";

/// Relative time label of freshly generated posts.
pub const FRESH_POST_LABEL: &str = "just now";

const SUMMARY_FALLBACK_CHARS: usize = 300;
const SUMMARY_MARKER: &str = "Summary:";
const COORDS_MARKER: &str = "Coords:";

// ============================================================================
// Payload parsing
// ============================================================================

/// Strip a surrounding Markdown code fence (```json ... ```), if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

/// Parse a structured payload. Anything unparsable becomes `Value::Null`.
pub fn parse_payload(raw: &str) -> Value {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        tracing::debug!("empty structured payload, using defaults");
        return Value::Null;
    }
    match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "unparsable structured payload, using defaults");
            Value::Null
        }
    }
}

fn as_object(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            tracing::warn!(kind = value_kind(other), "expected a JSON object, using defaults");
            Map::new()
        }
    }
}

fn as_array(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(kind = value_kind(other), "expected a JSON array, using defaults");
            Vec::new()
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Field accessors
// ============================================================================

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    text(obj, key)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    let n = match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn flag(obj: &Map<String, Value>, key: &str) -> bool {
    match obj.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn text_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .map(as_array)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn objects(obj: &Map<String, Value>, key: &str) -> Vec<Map<String, Value>> {
    obj.get(key)
        .map(as_array)
        .unwrap_or_default()
        .iter()
        .filter_map(|item| item.as_object().cloned())
        .collect()
}

fn severity(obj: &Map<String, Value>, key: &str) -> Severity {
    text(obj, key)
        .and_then(|s| Severity::parse_lenient(&s))
        .unwrap_or_default()
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ============================================================================
// Structured records
// ============================================================================

pub fn normalize_satellite(raw: &str) -> SatelliteReport {
    let obj = as_object(&parse_payload(raw));
    SatelliteReport {
        category: text(&obj, "disasterType")
            .map(|s| DisasterCategory::parse_lenient(&s))
            .unwrap_or_default(),
        severity: severity(&obj, "riskLevel"),
        confidence: number(&obj, "confidence").unwrap_or(0.0).clamp(0.0, 1.0),
        anomalies: text_list(&obj, "detectedAnomalies"),
        summary: text(&obj, "summary").unwrap_or_default(),
    }
}

pub fn normalize_logistics(raw: &str) -> LogisticsPlan {
    let obj = as_object(&parse_payload(raw));
    LogisticsPlan {
        safe_zones: objects(&obj, "safeZones")
            .iter()
            .map(|z| SafeZone {
                name: text(z, "name").unwrap_or_default(),
                capacity: text(z, "capacity").unwrap_or_default(),
                status: text(z, "status").unwrap_or_default(),
            })
            .collect(),
        medical_facilities: objects(&obj, "hospitals")
            .iter()
            .map(|h| MedicalFacility {
                name: text(h, "name").unwrap_or_default(),
                trauma_level: text(h, "traumaLevel").unwrap_or_default(),
                distance: text(h, "distance").unwrap_or_default(),
            })
            .collect(),
        resource_needs: text_list(&obj, "resourceNeeds"),
        tactical_advice: text(&obj, "tacticalAdvice").unwrap_or_default(),
    }
}

/// Forecast alerts: never live, always flagged as predictions.
pub fn normalize_predictions(raw: &str) -> Vec<Alert> {
    as_array(&parse_payload(raw))
        .iter()
        .filter_map(Value::as_object)
        .map(|p| Alert {
            id: format!("pred-{}", new_id()),
            time: PREDICTED_TIME_LABEL.to_string(),
            category: text_or(p, "type", FALLBACK_CATEGORY),
            location: text_or(p, "location", FALLBACK_LOCATION),
            severity: severity(p, "severity"),
            summary: text(p, "summary").unwrap_or_default(),
            is_live: false,
            is_prediction: true,
            coordinates: Coordinates::new(
                number(p, "lat").unwrap_or(0.0),
                number(p, "lng").unwrap_or(0.0),
            ),
            sources: Vec::new(),
        })
        .collect()
}

pub fn normalize_social_posts(raw: &str) -> Vec<SocialPost> {
    as_array(&parse_payload(raw))
        .iter()
        .filter_map(Value::as_object)
        .map(|p| SocialPost {
            id: new_id(),
            author: text_or(p, "username", "anonymous"),
            text: text(p, "text").unwrap_or_default(),
            time_label: FRESH_POST_LABEL.to_string(),
            is_new: true,
        })
        .collect()
}

pub fn normalize_insight(raw: &str) -> SocialInsight {
    let obj = as_object(&parse_payload(raw));
    SocialInsight {
        post_count: number(&obj, "postCount")
            .map(|n| n.max(0.0).min(u32::MAX as f64) as u32)
            .unwrap_or(0),
        sentiment_score: number(&obj, "sentimentScore")
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0),
        trending_keywords: text_list(&obj, "trendingKeywords"),
        elevated_concern: flag(&obj, "alertTriggered"),
        rationale: text(&obj, "rawTextAnalysis").unwrap_or_default(),
    }
}

pub fn normalize_prevention(raw: &str) -> PreventionStrategy {
    let obj = as_object(&parse_payload(raw));
    PreventionStrategy {
        name: text(&obj, "blueprintName").unwrap_or_default(),
        readiness_score: number(&obj, "readinessScore")
            .unwrap_or(0.0)
            .clamp(0.0, 100.0),
        checklist: objects(&obj, "checklist")
            .iter()
            .filter_map(|item| {
                let task = text(item, "task").filter(|t| !t.is_empty())?;
                Some(ChecklistItem {
                    task,
                    priority: text(item, "priority")
                        .and_then(|p| Priority::parse_lenient(&p))
                        .unwrap_or_default(),
                })
            })
            .collect(),
        mitigation_steps: text_list(&obj, "mitigationSteps"),
        evacuation_steps: text_list(&obj, "evacuationProtocols"),
    }
}

// ============================================================================
// Free-text live incident
// ============================================================================

struct IncidentPatterns {
    lat: Regex,
    lng: Regex,
    category: Regex,
    location: Regex,
}

fn incident_patterns() -> Option<&'static IncidentPatterns> {
    static PATTERNS: OnceLock<Option<IncidentPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            Some(IncidentPatterns {
                lat: Regex::new(r"(?i)Lat:?\s*([-+]?\d*\.?\d+)").ok()?,
                lng: Regex::new(r"(?i)Lng:?\s*([-+]?\d*\.?\d+)").ok()?,
                category: Regex::new(r"(?i)Type:?\s*([^\n,.]+)").ok()?,
                location: Regex::new(r"(?i)Location:?\s*([^\n,.]+)").ok()?,
            })
        })
        .as_ref()
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

fn extract_summary(text: &str) -> String {
    let between = text.find(SUMMARY_MARKER).and_then(|start| {
        let after = &text[start + SUMMARY_MARKER.len()..];
        after.find(COORDS_MARKER).map(|end| &after[..end])
    });
    match between {
        Some(summary) => summary.trim().to_string(),
        None => text
            .chars()
            .take(SUMMARY_FALLBACK_CHARS)
            .collect::<String>()
            .trim()
            .to_string(),
    }
}

/// Build a live alert from search-grounded free text.
///
/// Each field is extracted independently; a missing marker only affects
/// that field. `fallback` is the caller's coordinate, used per axis when the
/// text carries none.
pub fn extract_incident(
    text: &str,
    citations: &[GroundingCitation],
    fallback: Option<Coordinates>,
) -> Alert {
    let fallback = fallback.unwrap_or(Coordinates::ORIGIN);
    let patterns = incident_patterns();
    if patterns.is_none() {
        tracing::warn!("incident patterns unavailable, using fallbacks");
    }
    let capture = |re: Option<&Regex>| re.and_then(|re| first_capture(re, text));
    let coordinate = |re: Option<&Regex>| {
        capture(re)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };

    let category = capture(patterns.map(|p| &p.category)).unwrap_or(FALLBACK_CATEGORY);
    let location = capture(patterns.map(|p| &p.location)).unwrap_or(FALLBACK_LOCATION);
    let lat = coordinate(patterns.map(|p| &p.lat)).unwrap_or(fallback.lat);
    let lng = coordinate(patterns.map(|p| &p.lng)).unwrap_or(fallback.lng);

    let severity = if text.to_lowercase().contains("critical") {
        Severity::Critical
    } else {
        Severity::High
    };

    let sources = citations
        .iter()
        .filter_map(|c| c.web.as_ref())
        .map(|web| AlertSource {
            uri: web.uri.clone().unwrap_or_default(),
            title: web.title.clone().unwrap_or_default(),
        })
        .collect();

    Alert {
        id: new_id(),
        time: Local::now().format("%H:%M").to_string(),
        category: category.to_string(),
        location: location.to_string(),
        severity,
        summary: extract_summary(text),
        is_live: true,
        is_prediction: false,
        coordinates: Coordinates::new(lat, lng),
        sources,
    }
}
