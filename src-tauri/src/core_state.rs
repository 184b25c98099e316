//! Application state shared by every IPC command.
//!
//! `CoreState` is wrapped in `Arc` at startup and managed by Tauri. It owns the
//! presentation store and the consent broker, and holds the platform backends
//! behind their traits so the sync flow never sees a concrete store.

use std::sync::Arc;

use crate::config::{ConfigError, SyncConfig};
use crate::health_store::local::LocalHealthStore;
use crate::health_store::{
    ConsentBroker, DayWindow, HealthRecordsClient, PermissionController, StepDataSource,
};
use crate::models::PermissionSet;
use crate::permissions::PermissionGate;
use crate::presentation::PresentationStore;
use crate::sync::{SyncFlow, SyncReport};
use crate::uploader::{LiveEndpointClient, StepSink};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Sync is not configured: {0}")]
    Configuration(String),
    #[error("A sync is already running")]
    SyncInProgress,
    #[error("{0}")]
    Upload(String),
}

pub struct CoreState {
    /// Kept as text on failure so every sync can report it.
    config: Result<SyncConfig, String>,
    presentation: PresentationStore,
    consent: Arc<ConsentBroker>,
    permissions: Arc<dyn PermissionController>,
    records: Arc<dyn HealthRecordsClient>,
}

impl CoreState {
    pub fn new(
        config: Result<SyncConfig, ConfigError>,
        permissions: Arc<dyn PermissionController>,
        records: Arc<dyn HealthRecordsClient>,
        consent: Arc<ConsentBroker>,
    ) -> Self {
        Self {
            config: config.map_err(|e| e.to_string()),
            presentation: PresentationStore::new(),
            consent,
            permissions,
            records,
        }
    }

    /// Desktop wiring: JSON export store with consent routed to the UI.
    pub fn with_local_store(config: Result<SyncConfig, ConfigError>) -> Self {
        let consent = Arc::new(ConsentBroker::new());
        let data_path = config
            .as_ref()
            .ok()
            .and_then(|c| c.health_data_path.clone());
        let store = Arc::new(LocalHealthStore::new(data_path, Arc::clone(&consent)));
        Self::new(config, store.clone(), store, consent)
    }

    pub fn config(&self) -> Result<&SyncConfig, CoreError> {
        self.config
            .as_ref()
            .map_err(|e| CoreError::Configuration(e.clone()))
    }

    pub fn presentation(&self) -> &PresentationStore {
        &self.presentation
    }

    pub fn consent(&self) -> &ConsentBroker {
        &self.consent
    }

    pub fn gate(&self) -> PermissionGate {
        PermissionGate::new(Arc::clone(&self.permissions))
    }

    pub fn data_source(&self) -> StepDataSource {
        StepDataSource::new(Arc::clone(&self.records))
    }

    /// Startup checks: platform availability, configuration, current grants.
    /// Blocking; run off the main thread.
    pub fn check_startup(&self) {
        let availability = self.gate().availability();
        self.presentation.set_health_available(availability.is_available());
        if let Some(message) = availability.user_message() {
            tracing::warn!(?availability, "Health service unusable");
            self.presentation.set_message(message);
            self.presentation.set_permissions_granted(false);
            return;
        }

        if let Err(e) = self.config() {
            tracing::warn!(error = %e, "Sync configuration incomplete");
            self.presentation.set_message(e.to_string());
        }

        self.refresh_permissions();
    }

    /// Re-read grants and publish the result. Blocking.
    pub fn refresh_permissions(&self) -> bool {
        let granted = self.gate().has_all_permissions(&PermissionSet::step_sync());
        self.presentation.set_permissions_granted(granted);
        granted
    }

    /// Sync today's steps to the configured endpoint. Blocking.
    pub fn sync_today(&self) -> Result<SyncReport, CoreError> {
        let sink = self.config().and_then(|config| {
            LiveEndpointClient::from_config(config).map_err(|e| CoreError::Upload(e.to_string()))
        });
        match sink {
            Ok(sink) => self.sync_with(&DayWindow::today_local(), Arc::new(sink)),
            Err(e) => {
                tracing::warn!(error = %e, "Sync not started");
                self.presentation.set_message(e.to_string());
                Err(e)
            }
        }
    }

    /// Sync one day window through an explicit sink. Blocking.
    pub fn sync_with(
        &self,
        window: &DayWindow,
        sink: Arc<dyn StepSink>,
    ) -> Result<SyncReport, CoreError> {
        let flow = SyncFlow::new(self.gate(), self.data_source(), sink);
        flow.trigger(window, &self.presentation)
            .ok_or(CoreError::SyncInProgress)
    }
}
