//! Desktop health store backed by a JSON step export.
//!
//! Stands in for the platform store on machines without one. Grants live in
//! memory for the process lifetime; consent prompts are routed to the display
//! surface through the `ConsentBroker`.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{
    ConsentBroker, DayWindow, HealthAvailability, HealthRecordsClient, HealthStoreError,
    PermissionController,
};
use crate::models::{PermissionSet, StepRecord};

/// On-disk shape of the export: `{"steps": [StepRecord, ...]}`.
#[derive(Debug, Default, Deserialize)]
struct HealthExport {
    #[serde(default)]
    steps: Vec<StepRecord>,
}

pub struct LocalHealthStore {
    /// `None` means "no data source configured": every query returns nothing.
    data_path: Option<PathBuf>,
    granted: RwLock<BTreeSet<String>>,
    consent: Arc<ConsentBroker>,
}

impl LocalHealthStore {
    pub fn new(data_path: Option<PathBuf>, consent: Arc<ConsentBroker>) -> Self {
        Self {
            data_path,
            granted: RwLock::new(BTreeSet::new()),
            consent,
        }
    }

    fn load_records(&self) -> Result<Vec<StepRecord>, HealthStoreError> {
        let Some(path) = &self.data_path else {
            return Ok(Vec::new());
        };
        if !path.exists() {
            return Err(HealthStoreError::Unavailable);
        }
        let raw = std::fs::read_to_string(path)?;
        let export: HealthExport = serde_json::from_str(&raw)?;
        Ok(export.steps)
    }

    fn records_in(&self, window: &DayWindow) -> Result<Vec<StepRecord>, HealthStoreError> {
        Ok(self
            .load_records()?
            .into_iter()
            .filter(|r| window.intersects(r.start_time, r.end_time))
            .collect())
    }
}

impl PermissionController for LocalHealthStore {
    fn availability(&self) -> HealthAvailability {
        match &self.data_path {
            Some(path) if !path.exists() => HealthAvailability::NotInstalled,
            _ => HealthAvailability::Available,
        }
    }

    fn granted_permissions(&self) -> Result<BTreeSet<String>, HealthStoreError> {
        self.granted
            .read()
            .map(|granted| granted.clone())
            .map_err(|_| HealthStoreError::Query("grant table lock poisoned".into()))
    }

    fn request_permissions(
        &self,
        required: &PermissionSet,
    ) -> Result<BTreeSet<String>, HealthStoreError> {
        let answered = self.consent.request(required)?;
        let mut granted = self
            .granted
            .write()
            .map_err(|_| HealthStoreError::Query("grant table lock poisoned".into()))?;
        granted.extend(answered.iter().cloned());
        Ok(answered)
    }
}

impl HealthRecordsClient for LocalHealthStore {
    fn read_step_records(&self, window: &DayWindow) -> Result<Vec<StepRecord>, HealthStoreError> {
        self.records_in(window)
    }

    fn aggregate_step_total(&self, window: &DayWindow) -> Result<Option<u64>, HealthStoreError> {
        let records = self.records_in(window)?;
        Ok(deduplicated_total(&records))
    }
}

/// Sum of counts, counting a repeated observation only once.
///
/// Records with the same start, end and count are one observation, whichever
/// app wrote them (a watch mirrored by the phone, or one app exporting twice).
/// Returns `None` when there are no records.
pub fn deduplicated_total(records: &[StepRecord]) -> Option<u64> {
    if records.is_empty() {
        return None;
    }
    let mut seen: HashSet<(DateTime<Utc>, DateTime<Utc>, u64)> = HashSet::new();
    let total = records
        .iter()
        .filter(|r| seen.insert((r.start_time, r.end_time, r.count)))
        .map(|r| r.count)
        .sum();
    Some(total)
}
