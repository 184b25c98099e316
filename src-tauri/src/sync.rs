//! Sync flow — one attempt to read today's steps and deliver them.
//!
//! ```text
//! Idle → CheckingPermissions ─┬─────────────────────────→ Fetching → Posting → Done → Idle
//!                             └→ AwaitingConsent ─┬→ Fetching
//!                                                 └→ Done(Permission denied.) → Idle
//! ```
//!
//! Every call into the platform and the endpoint is blocking and sequential;
//! `SyncFlow::trigger` must run on a background thread. Each attempt ends in
//! exactly one `SyncOutcome`, whose message is written to the presentation
//! store together with `loading = false`. Nothing is retried.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::health_store::{DayWindow, StepDataSource};
use crate::models::{PermissionSet, SyncOutcome};
use crate::permissions::PermissionGate;
use crate::presentation::PresentationStore;
use crate::uploader::{StepSink, UploadError};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// States of the flow, in the order they are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Idle,
    CheckingPermissions,
    AwaitingConsent,
    Fetching,
    Posting,
    Done,
}

/// Why an attempt failed. `Display` is the line shown to the user.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Permission denied.")]
    PermissionDenied,

    #[error("No steps found for today.")]
    EmptyStepData,

    #[error("Error: {0}")]
    PlatformQuery(String),

    #[error("Failed: {status} {reason}")]
    HttpFailure { status: u16, reason: String },

    #[error("{0}")]
    Transport(String),
}

impl From<UploadError> for SyncError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Rejected { status, reason } => Self::HttpFailure { status, reason },
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Trace of one attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub attempt_id: Uuid,
    pub phases: Vec<SyncPhase>,
    pub outcome: SyncOutcome,
}

// ═══════════════════════════════════════════════════════════
// Flow
// ═══════════════════════════════════════════════════════════

pub struct SyncFlow {
    gate: PermissionGate,
    source: StepDataSource,
    sink: Arc<dyn StepSink>,
    required: PermissionSet,
}

impl SyncFlow {
    pub fn new(gate: PermissionGate, source: StepDataSource, sink: Arc<dyn StepSink>) -> Self {
        Self {
            gate,
            source,
            sink,
            required: PermissionSet::step_sync(),
        }
    }

    /// User-triggered entry point.
    ///
    /// Returns `None` without doing anything when a sync is already loading,
    /// which is the state in which the trigger control is disabled.
    pub fn trigger(&self, window: &DayWindow, presentation: &PresentationStore) -> Option<SyncReport> {
        if !presentation.try_begin_sync() {
            tracing::debug!("Sync trigger ignored: already loading");
            return None;
        }
        Some(self.run(window, presentation))
    }

    /// Run one attempt for `window` and publish its outcome.
    pub fn run(&self, window: &DayWindow, presentation: &PresentationStore) -> SyncReport {
        let attempt_id = Uuid::new_v4();
        let span = tracing::info_span!("sync", attempt = %attempt_id, date = %window.date);
        let _entered = span.enter();

        let mut phases = vec![SyncPhase::Idle];
        let outcome = match self.execute(window, presentation, &mut phases) {
            Ok(status) => {
                tracing::info!(status, "Sync succeeded");
                SyncOutcome::success(status)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sync failed");
                SyncOutcome::failure(e.to_string())
            }
        };

        phases.push(SyncPhase::Done);
        presentation.set_message(outcome.message());
        presentation.set_loading(false);
        phases.push(SyncPhase::Idle);

        SyncReport {
            attempt_id,
            phases,
            outcome,
        }
    }

    fn execute(
        &self,
        window: &DayWindow,
        presentation: &PresentationStore,
        phases: &mut Vec<SyncPhase>,
    ) -> Result<u16, SyncError> {
        phases.push(SyncPhase::CheckingPermissions);
        let granted = self.gate.has_all_permissions(&self.required);
        presentation.set_permissions_granted(granted);

        if !granted {
            phases.push(SyncPhase::AwaitingConsent);
            let answered = self.gate.request_permissions(&self.required);
            let complete = self.required.is_satisfied_by(&answered);
            presentation.set_permissions_granted(complete);
            if !complete {
                tracing::info!(
                    missing = ?self.required.missing_from(&answered),
                    "Consent did not cover required permissions"
                );
                return Err(SyncError::PermissionDenied);
            }
        }

        phases.push(SyncPhase::Fetching);
        let steps = self
            .source
            .fetch_daily_records(window)
            .map_err(|e| SyncError::PlatformQuery(e.to_string()))?;

        // A failed total does not block the upload; the count is just unknown.
        let total = match self.source.fetch_daily_total(window) {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(error = %e, "Step total unavailable, posting records anyway");
                None
            }
        };
        presentation.set_last_step_count(total);

        phases.push(SyncPhase::Posting);
        if steps.is_empty() {
            return Err(SyncError::EmptyStepData);
        }
        let response = self.sink.post_steps(&steps)?;
        Ok(response.status)
    }
}
