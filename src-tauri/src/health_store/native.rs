//! Wire contract with the native Health Connect plugin.
//!
//! | command                 | args                         | resolves with                        |
//! |-------------------------|------------------------------|--------------------------------------|
//! | `getSdkStatus`          | none                         | `{"status": "available" \| "update_required" \| "not_installed"}` |
//! | `getGrantedPermissions` | none                         | `{"granted": [id, ...]}`             |
//! | `requestPermissions`    | `{"permissions": [id, ...]}` | `{"granted": [id, ...]}`             |
//! | `readStepRecords`       | `{"startTime", "endTime"}`   | `{"records": [StepRecord, ...]}`     |
//! | `aggregateStepTotal`    | `{"startTime", "endTime"}`   | `{"total": n \| null}`               |
//!
//! Times are RFC 3339 UTC with a `Z` suffix, which `java.time.Instant.parse`
//! accepts on every API level. Failures reject with the exception message.

// Only the Android backend sends these; the host build keeps them for tests.
#![cfg_attr(not(target_os = "android"), allow(dead_code))]

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use super::{DayWindow, HealthAvailability};
use crate::models::StepRecord;

#[derive(Debug, Deserialize)]
pub struct SdkStatusResponse {
    pub status: HealthAvailability,
}

#[derive(Debug, Deserialize)]
pub struct GrantedResponse {
    pub granted: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PermissionsArgs<'a> {
    pub permissions: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeArgs {
    pub start_time: String,
    pub end_time: String,
}

impl TimeRangeArgs {
    pub fn from_window(window: &DayWindow) -> Self {
        Self {
            start_time: window.start.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            end_time: window.end.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordsResponse {
    pub records: Vec<StepRecord>,
}

#[derive(Debug, Deserialize)]
pub struct AggregateResponse {
    pub total: Option<u64>,
}
