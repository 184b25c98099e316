//! Presentation state — what the display surface renders.
//!
//! Independent fields, written by the sync flow and the startup checks only.
//! Every write emits one `PresentationUpdate` on a broadcast channel, in write
//! order; the display bridge forwards those as `presentation-update` events.
//! The store knows nothing about how (or whether) anything is rendered.

use std::sync::RwLock;

use serde::Serialize;
use tokio::sync::broadcast;

/// Slow subscribers past this many updates miss the oldest ones.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Point-in-time copy of every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresentationSnapshot {
    pub loading: bool,
    pub message: String,
    pub permissions_granted: bool,
    pub last_step_count: Option<u64>,
    /// Platform health service usable. False until the startup check runs.
    pub health_available: bool,
}

impl PresentationSnapshot {
    /// The step count is only shown next to a successful sync message.
    pub fn show_step_count(&self) -> bool {
        self.last_step_count.is_some() && self.message.starts_with("Success")
    }

    /// The trigger control is enabled only when a sync could start.
    pub fn can_sync(&self) -> bool {
        self.health_available && !self.loading
    }
}

/// One field write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum PresentationUpdate {
    Loading(bool),
    Message(String),
    PermissionsGranted(bool),
    LastStepCount(Option<u64>),
    HealthAvailable(bool),
}

pub struct PresentationStore {
    state: RwLock<PresentationSnapshot>,
    updates: broadcast::Sender<PresentationUpdate>,
}

impl PresentationStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            state: RwLock::new(PresentationSnapshot::default()),
            updates,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PresentationUpdate> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> PresentationSnapshot {
        self.state
            .read()
            .map(|state| state.clone())
            .unwrap_or_default()
    }

    pub fn set_loading(&self, loading: bool) {
        self.apply(PresentationUpdate::Loading(loading));
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.apply(PresentationUpdate::Message(message.into()));
    }

    pub fn set_permissions_granted(&self, granted: bool) {
        self.apply(PresentationUpdate::PermissionsGranted(granted));
    }

    pub fn set_last_step_count(&self, count: Option<u64>) {
        self.apply(PresentationUpdate::LastStepCount(count));
    }

    pub fn set_health_available(&self, available: bool) {
        self.apply(PresentationUpdate::HealthAvailable(available));
    }

    /// Flip `loading` on unless it already is. This is the trigger guard:
    /// a sync may only start from a non-loading state.
    pub fn try_begin_sync(&self) -> bool {
        let Ok(mut state) = self.state.write() else {
            return false;
        };
        if state.loading {
            return false;
        }
        state.loading = true;
        let _ = self.updates.send(PresentationUpdate::Loading(true));
        true
    }

    /// Write one field and publish it. The send happens under the write guard
    /// so subscribers see updates in the same order as the writes.
    pub fn apply(&self, update: PresentationUpdate) {
        let Ok(mut state) = self.state.write() else {
            tracing::warn!(?update, "Presentation state lock poisoned, update dropped");
            return;
        };
        match &update {
            PresentationUpdate::Loading(v) => state.loading = *v,
            PresentationUpdate::Message(v) => state.message = v.clone(),
            PresentationUpdate::PermissionsGranted(v) => state.permissions_granted = *v,
            PresentationUpdate::LastStepCount(v) => state.last_step_count = *v,
            PresentationUpdate::HealthAvailable(v) => state.health_available = *v,
        }
        // No subscribers is fine: the snapshot still holds the value.
        let _ = self.updates.send(update);
    }
}

impl Default for PresentationStore {
    fn default() -> Self {
        Self::new()
    }
}
