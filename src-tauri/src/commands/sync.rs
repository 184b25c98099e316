//! Tauri IPC commands for the step sync screen.
//!
//! - get_presentation_state: current snapshot, for first render
//! - get_required_permissions: permission ids the sync needs
//! - check_permissions: re-read grants and publish the result
//! - sync_today_steps: run one sync for the local calendar day
//! - get_pending_consent: the open consent prompt, if any
//! - resolve_consent / dismiss_consent: answer an open consent prompt

use std::sync::Arc;

use serde::Serialize;
use tauri::State;

use crate::core_state::CoreState;
use crate::health_store::ConsentRequest;
use crate::models::PermissionSet;
use crate::presentation::PresentationSnapshot;
use crate::sync::SyncReport;

/// Snapshot plus the derived display flags.
#[derive(Debug, Clone, Serialize)]
pub struct PresentationView {
    #[serde(flatten)]
    pub snapshot: PresentationSnapshot,
    pub show_step_count: bool,
    pub can_sync: bool,
}

impl From<PresentationSnapshot> for PresentationView {
    fn from(snapshot: PresentationSnapshot) -> Self {
        let show_step_count = snapshot.show_step_count();
        let can_sync = snapshot.can_sync();
        Self {
            snapshot,
            show_step_count,
            can_sync,
        }
    }
}

#[tauri::command]
pub fn get_presentation_state(state: State<'_, Arc<CoreState>>) -> PresentationView {
    state.presentation().snapshot().into()
}

#[tauri::command]
pub fn get_required_permissions() -> Vec<String> {
    PermissionSet::step_sync().to_vec()
}

/// Re-check grants without prompting.
///
/// Runs on a blocking thread (platform round trip).
#[tauri::command]
pub async fn check_permissions(state: State<'_, Arc<CoreState>>) -> Result<bool, String> {
    let state = state.inner().clone();
    tauri::async_runtime::spawn_blocking(move || state.refresh_permissions())
        .await
        .map_err(|e| format!("Task failed: {e}"))
}

/// Read today's steps and post them to the live endpoint.
///
/// The outcome is also published through `presentation-update` events, so the
/// UI can ignore the returned report. Errors here mean the attempt never
/// started (missing configuration, a sync already running).
/// Runs on a blocking thread: the flow may wait on a consent prompt.
#[tauri::command]
pub async fn sync_today_steps(state: State<'_, Arc<CoreState>>) -> Result<SyncReport, String> {
    let state = state.inner().clone();
    tauri::async_runtime::spawn_blocking(move || state.sync_today().map_err(|e| e.to_string()))
        .await
        .map_err(|e| format!("Task failed: {e}"))?
}

/// The consent prompt a blocked sync is waiting on, if any.
///
/// Called on page load so a prompt published before the page was listening
/// is still shown.
#[tauri::command]
pub fn get_pending_consent(state: State<'_, Arc<CoreState>>) -> Option<ConsentRequest> {
    state.consent().pending_request()
}

/// Answer the open consent prompt with the ids the user allowed.
#[tauri::command]
pub fn resolve_consent(
    request_id: String,
    granted: Vec<String>,
    state: State<'_, Arc<CoreState>>,
) -> Result<(), String> {
    tracing::info!(request_id = %request_id, granted = granted.len(), "Consent answered");
    state
        .consent()
        .resolve(&request_id, granted)
        .map_err(|e| e.to_string())
}

/// Close the open consent prompt without granting anything.
#[tauri::command]
pub fn dismiss_consent(request_id: String, state: State<'_, Arc<CoreState>>) -> Result<(), String> {
    tracing::info!(request_id = %request_id, "Consent dismissed");
    state
        .consent()
        .dismiss(&request_id)
        .map_err(|e| e.to_string())
}
