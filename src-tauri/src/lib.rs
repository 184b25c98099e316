pub mod bridge;
pub mod commands;
pub mod config;
pub mod core_state;
pub mod health_store;
pub mod models;
pub mod permissions;
pub mod presentation;
pub mod sync;
pub mod uploader;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tauri::Manager;
use tracing_subscriber::EnvFilter;

use crate::config::SyncConfig;
use crate::core_state::CoreState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("StepSync starting v{}", config::APP_VERSION);

    let config = SyncConfig::load();
    if let Err(e) = &config {
        tracing::warn!(error = %e, "Sync configuration incomplete");
    }

    let builder = tauri::Builder::default();
    #[cfg(target_os = "android")]
    let builder = builder.plugin(health_store::android::init());

    builder
        .setup(move |app| {
            let state = Arc::new(build_state(app.handle(), config));
            bridge::start_event_forwarding(app.handle(), &state);

            let startup = Arc::clone(&state);
            tauri::async_runtime::spawn_blocking(move || startup.check_startup());

            app.manage(state);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::health_check,
            commands::sync::get_presentation_state,
            commands::sync::get_required_permissions,
            commands::sync::check_permissions,
            commands::sync::sync_today_steps,
            commands::sync::get_pending_consent,
            commands::sync::resolve_consent,
            commands::sync::dismiss_consent,
        ])
        .run(tauri::generate_context!())
        .expect("error while running StepSync");
}

#[cfg(target_os = "android")]
fn build_state(
    app: &tauri::AppHandle,
    config: Result<SyncConfig, config::ConfigError>,
) -> CoreState {
    use health_store::android::AndroidHealthStore;
    use health_store::ConsentBroker;

    let store = Arc::clone(app.state::<Arc<AndroidHealthStore<tauri::Wry>>>().inner());
    CoreState::new(config, store.clone(), store, Arc::new(ConsentBroker::new()))
}

#[cfg(not(target_os = "android"))]
fn build_state(
    _app: &tauri::AppHandle,
    config: Result<SyncConfig, config::ConfigError>,
) -> CoreState {
    CoreState::with_local_store(config)
}
