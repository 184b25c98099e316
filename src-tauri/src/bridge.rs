//! Display bridge: forwards state-store broadcasts to the webview as events.
//!
//! - `presentation-update`: one `PresentationUpdate` per field write
//! - `consent-requested`: a `ConsentRequest` the UI must answer via
//!   `resolve_consent`

use std::sync::Arc;

use serde::Serialize;
use tauri::{AppHandle, Emitter, Runtime};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::core_state::CoreState;

pub const PRESENTATION_EVENT: &str = "presentation-update";
pub const CONSENT_EVENT: &str = "consent-requested";

/// Start both forwarding tasks. Call from the Tauri `.setup()` callback.
pub fn start_event_forwarding<R: Runtime>(app: &AppHandle<R>, state: &Arc<CoreState>) {
    forward(app.clone(), state.presentation().subscribe(), PRESENTATION_EVENT);
    forward(app.clone(), state.consent().subscribe(), CONSENT_EVENT);
}

fn forward<R, T>(app: AppHandle<R>, mut rx: broadcast::Receiver<T>, event: &'static str)
where
    R: Runtime,
    T: Serialize + Clone + Send + 'static,
{
    tauri::async_runtime::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(payload) => {
                    if let Err(e) = app.emit(event, &payload) {
                        tracing::warn!(event, error = %e, "Failed to emit event");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // The UI re-reads get_presentation_state on its own; log and go on.
                    tracing::warn!(event, skipped, "Event forwarder lagged");
                }
                Err(RecvError::Closed) => {
                    tracing::debug!(event, "Event source closed");
                    break;
                }
            }
        }
    });
}
