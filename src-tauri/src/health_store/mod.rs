//! Platform health store seam.
//!
//! The health-data store, its query engine, and its consent UI belong to the
//! platform. Two traits describe what the sync needs from it:
//! - `PermissionController`: availability, granted capabilities, consent requests
//! - `HealthRecordsClient`: raw step records and the deduplicated daily total
//!
//! Backends: `local::LocalHealthStore` (desktop, JSON export + in-memory grants)
//! and `android::AndroidHealthStore` (native plugin bridge, Android only).

pub mod consent;
pub mod local;
pub mod native;
pub mod source;

#[cfg(target_os = "android")]
pub mod android;

use std::collections::BTreeSet;

use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{PermissionSet, StepRecord};

pub use consent::{ConsentBroker, ConsentError, ConsentRequest};
pub use source::StepDataSource;

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum HealthStoreError {
    #[error("Health data service is not available")]
    Unavailable,

    #[error("Health data query failed: {0}")]
    Query(String),

    #[error("Consent request failed: {0}")]
    Consent(#[from] ConsentError),

    #[error("Cannot read health data export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed health data export: {0}")]
    Parse(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════════════════════
// Availability
// ═══════════════════════════════════════════════════════════

/// Whether the platform health service can be used at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthAvailability {
    Available,
    /// Service provider app missing on this device.
    NotInstalled,
    /// Installed, but too old for the calls we make.
    UpdateRequired,
    Unavailable,
}

impl HealthAvailability {
    pub fn is_available(self) -> bool {
        self == Self::Available
    }

    /// Message shown instead of the sync controls when unusable.
    pub fn user_message(self) -> Option<&'static str> {
        match self {
            Self::Available => None,
            Self::UpdateRequired => {
                Some("Health Connect needs to be updated before steps can be read.")
            }
            Self::NotInstalled | Self::Unavailable => {
                Some("Health Connect is not available or not installed on this device.")
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Traits
// ═══════════════════════════════════════════════════════════

/// Capability grants and the consent flow.
pub trait PermissionController: Send + Sync {
    /// SDK status of the platform service.
    fn availability(&self) -> HealthAvailability;

    /// Every capability id currently granted to this app.
    fn granted_permissions(&self) -> Result<BTreeSet<String>, HealthStoreError>;

    /// Show the consent UI and block until the user finishes or dismisses it.
    /// Returns whatever was actually granted, possibly nothing.
    fn request_permissions(
        &self,
        required: &PermissionSet,
    ) -> Result<BTreeSet<String>, HealthStoreError>;
}

/// Step queries against the platform store.
pub trait HealthRecordsClient: Send + Sync {
    /// Raw step records inside `window`, in platform order.
    fn read_step_records(&self, window: &DayWindow) -> Result<Vec<StepRecord>, HealthStoreError>;

    /// Deduplicated step total over `window`. `None` when the platform has no value.
    fn aggregate_step_total(&self, window: &DayWindow) -> Result<Option<u64>, HealthStoreError>;
}

// ═══════════════════════════════════════════════════════════
// Day window
// ═══════════════════════════════════════════════════════════

/// `[start of day, start of next day)` for one calendar date in a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Today in the device's local zone. Evaluated once per call.
    pub fn today_local() -> Self {
        let today = Local::now().date_naive();
        Self::for_date(today, &Local)
    }

    pub fn for_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Self {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        Self {
            date,
            start: start_of_day(date, tz),
            end: start_of_day(next, tz),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// An interval belongs to the day if any part of it falls inside the
    /// window. Records straddling either midnight count. A zero-length record
    /// belongs to the day its instant falls in.
    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        if start == end {
            return self.contains(start);
        }
        start < self.end && end > self.start
    }
}

/// First instant of `date` in `tz`.
///
/// An ambiguous midnight resolves to the earlier instant. A midnight inside a
/// DST gap resolves to the first valid local time after it.
fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    const GAP_STEP_MINUTES: u32 = 15;
    const GAP_STEPS: u32 = 24 * 60 / GAP_STEP_MINUTES;

    let midnight = date.and_time(NaiveTime::MIN);
    for step in 0..=GAP_STEPS {
        let candidate = midnight + chrono::Duration::minutes(i64::from(step * GAP_STEP_MINUTES));
        if let Some(instant) = tz.from_local_datetime(&candidate).earliest() {
            return instant.with_timezone(&Utc);
        }
    }
    Utc.from_utc_datetime(&midnight)
}
