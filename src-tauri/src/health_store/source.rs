//! Step data source: today's records and today's total, mapped for upload.

use std::sync::Arc;

use super::{DayWindow, HealthRecordsClient, HealthStoreError};
use crate::models::{DailyTotal, StepInterval};

/// Reads step data for one day window from the platform store.
#[derive(Clone)]
pub struct StepDataSource {
    records: Arc<dyn HealthRecordsClient>,
}

impl StepDataSource {
    pub fn new(records: Arc<dyn HealthRecordsClient>) -> Self {
        Self { records }
    }

    /// Every step record in the window, mapped 1:1 and in platform order.
    pub fn fetch_daily_records(
        &self,
        window: &DayWindow,
    ) -> Result<Vec<StepInterval>, HealthStoreError> {
        let records = self.records.read_step_records(window)?;

        let outside = records
            .iter()
            .filter(|r| !window.intersects(r.start_time, r.end_time))
            .count();
        if outside > 0 {
            tracing::warn!(
                date = %window.date,
                outside,
                "Platform returned step records outside the requested day"
            );
        }

        tracing::debug!(date = %window.date, records = records.len(), "Fetched step records");
        Ok(records.iter().map(StepInterval::from).collect())
    }

    /// Aggregate (deduplicated) total for the window.
    pub fn fetch_daily_total(&self, window: &DayWindow) -> Result<DailyTotal, HealthStoreError> {
        let total = self.records.aggregate_step_total(window)?;
        tracing::debug!(date = %window.date, total = ?total, "Fetched step total");
        Ok(total)
    }
}
