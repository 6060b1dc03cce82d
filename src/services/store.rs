//! Incident Store
//!
//! The in-memory working set the dashboard renders: alerts (live incidents,
//! boot-time samples and forecasts), the latest synthesized social posts and
//! the latest sentiment insight. Writes go through the merge operations
//! below; everything else is read-only access.

use std::collections::HashSet;

use aegis_command_core::{Alert, AlertSource, Coordinates, Severity, SocialInsight, SocialPost};

use crate::models::response::DashboardSummary;
use crate::models::settings::DEFAULT_ALERT_CAPACITY;

/// Owned working set of dashboard entities.
#[derive(Debug, Clone)]
pub struct IncidentStore {
    alerts: Vec<Alert>,
    social_posts: Vec<SocialPost>,
    insight: Option<SocialInsight>,
    capacity: usize,
}

impl Default for IncidentStore {
    fn default() -> Self {
        Self::with_samples(DEFAULT_ALERT_CAPACITY)
    }
}

impl IncidentStore {
    /// Empty store holding at most `capacity` alerts after each live merge.
    pub fn new(capacity: usize) -> Self {
        Self {
            alerts: Vec::new(),
            social_posts: Vec::new(),
            insight: None,
            capacity: capacity.max(1),
        }
    }

    /// Store seeded with the placeholder alerts shown before the first sync.
    pub fn with_samples(capacity: usize) -> Self {
        let mut store = Self::new(capacity);
        store.alerts = sample_alerts();
        store.alerts.truncate(store.capacity);
        store
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Prepend a live incident.
    ///
    /// Placeholder alerts, forecasts and any older entry with the same id are
    /// evicted, then the list is cut to capacity (oldest entries go first).
    pub fn record_new_incident(&mut self, alert: Alert) {
        let mut next = Vec::with_capacity(self.capacity);
        let id = alert.id.clone();
        next.push(alert);
        next.extend(
            self.alerts
                .drain(..)
                .filter(|a| !a.is_placeholder() && !a.is_prediction && a.id != id),
        );
        next.truncate(self.capacity);
        self.alerts = next;
    }

    /// Append forecasts as-is: no capacity cut, no de-duplication.
    ///
    /// Repeated calls without an intervening live incident accumulate;
    /// `replace_predictions` is the bounded alternative.
    pub fn append_predictions(&mut self, predictions: Vec<Alert>) {
        self.alerts.extend(predictions);
    }

    /// Drop every existing forecast, then append `predictions` keeping only
    /// the first entry per (category, location), compared case-insensitively.
    pub fn replace_predictions(&mut self, predictions: Vec<Alert>) {
        self.alerts.retain(|a| !a.is_prediction);
        let mut seen = HashSet::new();
        for prediction in predictions {
            let key = (
                prediction.category.trim().to_lowercase(),
                prediction.location.trim().to_lowercase(),
            );
            if seen.insert(key) {
                self.alerts.push(prediction);
            } else {
                tracing::debug!(
                    category = %prediction.category,
                    location = %prediction.location,
                    "dropping duplicate prediction"
                );
            }
        }
    }

    pub fn replace_social_posts(&mut self, posts: Vec<SocialPost>) {
        self.social_posts = posts;
    }

    pub fn replace_insight(&mut self, insight: SocialInsight) {
        self.insight = Some(insight);
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn social_posts(&self) -> &[SocialPost] {
        &self.social_posts
    }

    pub fn insight(&self) -> Option<&SocialInsight> {
        self.insight.as_ref()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn find_alert(&self, id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// Alerts a response plan can be generated for (everything but forecasts).
    pub fn response_targets(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| !a.is_prediction)
    }

    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary::from_alerts(&self.alerts)
    }
}

#[allow(clippy::too_many_arguments)]
fn sample(
    id: &str,
    time: &str,
    category: &str,
    location: &str,
    severity: Severity,
    summary: &str,
    coordinates: Coordinates,
    sources: &[(&str, &str)],
) -> Alert {
    Alert {
        id: id.to_string(),
        time: time.to_string(),
        category: category.to_string(),
        location: location.to_string(),
        severity,
        summary: summary.to_string(),
        is_live: true,
        is_prediction: false,
        coordinates,
        sources: sources
            .iter()
            .map(|(uri, title)| AlertSource {
                uri: uri.to_string(),
                title: title.to_string(),
            })
            .collect(),
    }
}

/// The three placeholder alerts the dashboard boots with.
pub fn sample_alerts() -> Vec<Alert> {
    vec![
        sample(
            "sample-1",
            "08:45",
            "Wildfire Risk",
            "Ventura County, California",
            Severity::Critical,
            "High-intensity heat signatures detected via multi-spectral scan. Secondary \
             containment breaching. Strategic mitigation required for eastern perimeter to \
             protect residential nodes.",
            Coordinates::new(34.2746, -119.2290),
            &[
                ("https://www.fire.ca.gov/", "CalFire Incident Status"),
                ("https://twitter.com/VCFD", "VCFD Alerts"),
            ],
        ),
        sample(
            "sample-2",
            "10:05",
            "Seismic Anomaly",
            "Ishikawa Prefecture, Japan",
            Severity::High,
            "M6.4 seismic pulse confirmed. Pre-disaster hardening protocols in effect for Noto \
             Peninsula. Tsunami advisory active. Ground sensors indicate structural shifts in \
             coastal grids.",
            Coordinates::new(37.3917, 136.8986),
            &[("https://www.jma.go.jp/jma/indexe.html", "JMA Seismic Monitor")],
        ),
        sample(
            "sample-3",
            "11:12",
            "Cyclone Tracking",
            "Atlantic Basin Sector 4",
            Severity::Medium,
            "Tropical Storm Arlene intensified. Eye formation visible in high-res orbital \
             capture. Pre-emptive evacuation drills initiated for low-lying coastal zones.",
            Coordinates::new(25.0, -75.0),
            &[("https://www.nhc.noaa.gov/", "NHC Hurricane Tracker")],
        ),
    ]
}
