//! Android backend — bridges to the native Health Connect plugin.
//!
//! The native side (`app.stepsync.healthconnect.HealthConnectPlugin`, under
//! `gen/android`) owns the `HealthConnectClient` and the permission-result
//! contract. Payload shapes live in `native`. Every call here is a blocking
//! `run_mobile_plugin` round trip, so callers must be on a background thread.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tauri::plugin::{Builder, PluginHandle, TauriPlugin};
use tauri::{Manager, Runtime};

use super::native::{
    AggregateResponse, GrantedResponse, PermissionsArgs, RecordsResponse, SdkStatusResponse,
    TimeRangeArgs,
};
use super::{DayWindow, HealthAvailability, HealthRecordsClient, HealthStoreError, PermissionController};
use crate::models::{PermissionSet, StepRecord};

const PLUGIN_NAME: &str = "healthconnect";
const PLUGIN_PACKAGE: &str = "app.stepsync.healthconnect";
const PLUGIN_CLASS: &str = "HealthConnectPlugin";

/// Register the native plugin and manage an `Arc<AndroidHealthStore<R>>`.
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new(PLUGIN_NAME)
        .setup(|app, api| {
            let handle = api.register_android_plugin(PLUGIN_PACKAGE, PLUGIN_CLASS)?;
            app.manage(Arc::new(AndroidHealthStore { handle }));
            Ok(())
        })
        .build()
}

pub struct AndroidHealthStore<R: Runtime> {
    handle: PluginHandle<R>,
}

impl<R: Runtime> AndroidHealthStore<R> {
    fn call<T: serde::de::DeserializeOwned>(
        &self,
        command: &str,
        payload: impl Serialize,
    ) -> Result<T, HealthStoreError> {
        self.handle
            .run_mobile_plugin(command, payload)
            .map_err(|e| HealthStoreError::Query(format!("{command}: {e}")))
    }
}

impl<R: Runtime> PermissionController for AndroidHealthStore<R> {
    fn availability(&self) -> HealthAvailability {
        match self.call::<SdkStatusResponse>("getSdkStatus", ()) {
            Ok(response) => response.status,
            Err(e) => {
                tracing::warn!(error = %e, "Health Connect SDK status unavailable");
                HealthAvailability::Unavailable
            }
        }
    }

    fn granted_permissions(&self) -> Result<BTreeSet<String>, HealthStoreError> {
        let response: GrantedResponse = self.call("getGrantedPermissions", ())?;
        Ok(response.granted.into_iter().collect())
    }

    fn request_permissions(
        &self,
        required: &PermissionSet,
    ) -> Result<BTreeSet<String>, HealthStoreError> {
        let permissions = required.to_vec();
        let response: GrantedResponse =
            self.call("requestPermissions", PermissionsArgs { permissions: &permissions })?;
        Ok(response.granted.into_iter().collect())
    }
}

impl<R: Runtime> HealthRecordsClient for AndroidHealthStore<R> {
    fn read_step_records(&self, window: &DayWindow) -> Result<Vec<StepRecord>, HealthStoreError> {
        let response: RecordsResponse =
            self.call("readStepRecords", TimeRangeArgs::from_window(window))?;
        Ok(response.records)
    }

    fn aggregate_step_total(&self, window: &DayWindow) -> Result<Option<u64>, HealthStoreError> {
        let response: AggregateResponse =
            self.call("aggregateStepTotal", TimeRangeArgs::from_window(window))?;
        Ok(response.total)
    }
}
