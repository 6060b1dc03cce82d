//! System Sync
//!
//! The dashboard's main refresh: find a live incident, synthesize social
//! chatter about it, forecast upcoming events, then merge everything into the
//! store in one step. Only one sync runs at a time; a request made while one
//! is outstanding is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use aegis_command_core::{Alert, Coordinates};

use crate::services::busy::BusyFlag;
use crate::services::intel::IntelService;
use crate::services::store::IncidentStore;
use crate::utils::error::{AppError, AppResult};

/// Result of a sync request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Completed {
        incident: Alert,
        social_posts: usize,
        predictions: usize,
    },
    /// Another sync was already in flight; nothing was done.
    Skipped,
}

pub struct SyncCoordinator {
    intel: Arc<IntelService>,
    store: Arc<RwLock<IncidentStore>>,
    busy: BusyFlag,
    throttled: AtomicBool,
    dedupe_predictions: bool,
}

impl SyncCoordinator {
    pub fn new(
        intel: Arc<IntelService>,
        store: Arc<RwLock<IncidentStore>>,
        dedupe_predictions: bool,
    ) -> Self {
        Self {
            intel,
            store,
            busy: BusyFlag::new(),
            throttled: AtomicBool::new(false),
            dedupe_predictions,
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.busy.is_busy()
    }

    /// Whether the last sync ended in rate-limit exhaustion.
    pub fn is_throttled(&self) -> bool {
        self.throttled.load(Ordering::Acquire)
    }

    /// Run one sync. The store is only touched if every step succeeds.
    pub async fn trigger(&self, near: Option<Coordinates>) -> AppResult<SyncOutcome> {
        let Some(_guard) = self.busy.try_acquire() else {
            tracing::debug!("sync already in flight, ignoring request");
            return Ok(SyncOutcome::Skipped);
        };
        self.throttled.store(false, Ordering::Release);

        tracing::info!(?near, "sync started");
        let incident = match self.intel.live_incident(near).await {
            Ok(incident) => incident,
            Err(err) => return Err(self.fail("live_incident", err)),
        };
        let posts = match self.intel.social_chatter(&incident.summary).await {
            Ok(posts) => posts,
            Err(err) => return Err(self.fail("social_chatter", err)),
        };
        let predictions = match self.intel.predictions().await {
            Ok(predictions) => predictions,
            Err(err) => return Err(self.fail("predictions", err)),
        };

        let outcome = SyncOutcome::Completed {
            incident: incident.clone(),
            social_posts: posts.len(),
            predictions: predictions.len(),
        };

        {
            let mut store = self.store.write().await;
            store.record_new_incident(incident);
            store.replace_social_posts(posts);
            if self.dedupe_predictions {
                store.replace_predictions(predictions);
            } else {
                store.append_predictions(predictions);
            }
            tracing::info!(alerts = store.alerts().len(), "sync merged");
        }

        Ok(outcome)
    }

    fn fail(&self, step: &'static str, err: AppError) -> AppError {
        if err.is_throttled() {
            self.throttled.store(true, Ordering::Release);
            tracing::warn!(step, error = %err, "sync throttled");
        } else {
            tracing::error!(step, error = %err, "sync did not complete");
        }
        err
    }
}
