//! Application State
//!
//! Owns every service the commands operate on: the configuration, the shared
//! incident store, the intel and sync services, the briefing service and the
//! per-operation busy flags.

use std::sync::Arc;

use tokio::sync::RwLock;

use aegis_command_core::Coordinates;
use aegis_command_llm::{
    GeminiLiveConnector, GeminiProvider, GenerativeModel, LiveConnector, ProviderConfig,
};

use crate::models::response::{DashboardSummary, DashboardView};
use crate::models::settings::AppConfig;
use crate::services::briefing::BriefingService;
use crate::services::busy::BusyFlag;
use crate::services::intel::IntelService;
use crate::services::store::IncidentStore;
use crate::services::sync::SyncCoordinator;
use crate::utils::error::{AppError, AppResult};

/// Application state shared by all commands
pub struct AppState {
    config: AppConfig,
    /// Caller coordinate for the live incident search (overrides config)
    location: Option<Coordinates>,
    store: Arc<RwLock<IncidentStore>>,
    intel: Arc<IntelService>,
    sync: SyncCoordinator,
    briefing: BriefingService,
    satellite_busy: BusyFlag,
    logistics_busy: BusyFlag,
    prevention_busy: BusyFlag,
    social_busy: BusyFlag,
}

impl AppState {
    /// Build state around the given model and live-session connector.
    pub fn new(
        config: AppConfig,
        model: Arc<dyn GenerativeModel>,
        connector: Arc<dyn LiveConnector>,
    ) -> Self {
        let store = Arc::new(RwLock::new(IncidentStore::with_samples(config.alert_capacity)));
        let intel = Arc::new(IntelService::new(model, config.retry));
        let sync = SyncCoordinator::new(
            Arc::clone(&intel),
            Arc::clone(&store),
            config.dedupe_predictions,
        );
        let briefing =
            BriefingService::new(connector, config.live_model.clone(), config.voice.clone());

        Self {
            location: config.default_location,
            config,
            store,
            intel,
            sync,
            briefing,
            satellite_busy: BusyFlag::new(),
            logistics_busy: BusyFlag::new(),
            prevention_busy: BusyFlag::new(),
            social_busy: BusyFlag::new(),
        }
    }

    /// Build state backed by the Gemini services, reading the API key from
    /// the configured environment variable.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::validation)?;
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            tracing::warn!(env = %config.api_key_env, "API key not set; model calls will fail");
        }

        let provider_config = ProviderConfig {
            api_key,
            base_url: config.base_url.clone(),
            live_url: None,
            model: config.model.clone(),
            proxy: config.resolve_proxy(),
        };
        let live_config = ProviderConfig {
            model: config.live_model.clone(),
            ..provider_config.clone()
        };

        let model = Arc::new(GeminiProvider::new(provider_config)?);
        let connector = Arc::new(GeminiLiveConnector::new(live_config));
        Ok(Self::new(config, model, connector))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    /// Override the caller coordinate for subsequent syncs.
    pub fn set_location(&mut self, location: Option<Coordinates>) -> AppResult<()> {
        if let Some(c) = &location {
            if !c.is_valid() {
                return Err(AppError::validation(format!(
                    "Invalid coordinate: {}, {}",
                    c.lat, c.lng
                )));
            }
        }
        self.location = location;
        Ok(())
    }

    pub fn store(&self) -> &Arc<RwLock<IncidentStore>> {
        &self.store
    }

    pub fn intel(&self) -> &IntelService {
        &self.intel
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    pub fn briefing(&self) -> &BriefingService {
        &self.briefing
    }

    pub fn satellite_busy(&self) -> &BusyFlag {
        &self.satellite_busy
    }

    pub fn logistics_busy(&self) -> &BusyFlag {
        &self.logistics_busy
    }

    pub fn prevention_busy(&self) -> &BusyFlag {
        &self.prevention_busy
    }

    pub fn social_busy(&self) -> &BusyFlag {
        &self.social_busy
    }

    pub async fn summary(&self) -> DashboardSummary {
        self.store.read().await.summary()
    }

    /// Snapshot of everything the dashboard renders.
    pub async fn dashboard(&self) -> DashboardView {
        let store = self.store.read().await;
        DashboardView {
            summary: store.summary(),
            alerts: store.alerts().to_vec(),
            social_posts: store.social_posts().to_vec(),
            insight: store.insight().cloned(),
            throttled: self.sync.is_throttled(),
            syncing: self.sync.is_syncing(),
        }
    }
}
