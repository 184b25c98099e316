use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// A step record as the platform health store reports it.
///
/// Carries platform metadata (record id, zone offsets, writing app) that
/// never leaves the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub start_zone_offset_secs: Option<i32>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub end_zone_offset_secs: Option<i32>,
    pub count: u64,
    /// Package name of the app that wrote the record.
    #[serde(default)]
    pub data_origin: String,
}

/// One interval of the upload payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInterval {
    #[serde(serialize_with = "serialize_instant")]
    pub start_time: DateTime<Utc>,
    #[serde(serialize_with = "serialize_instant")]
    pub end_time: DateTime<Utc>,
    pub count: u64,
}

impl From<&StepRecord> for StepInterval {
    fn from(record: &StepRecord) -> Self {
        Self {
            start_time: record.start_time,
            end_time: record.end_time,
            count: record.count,
        }
    }
}

/// Deduplicated total for a day. `None` when the platform reports no value,
/// which is not the same thing as zero steps.
pub type DailyTotal = Option<u64>;

/// Request body for the live endpoint: `{"steps": [...]}`.
#[derive(Debug, Serialize)]
pub struct StepPayload<'a> {
    pub steps: &'a [StepInterval],
}

impl<'a> StepPayload<'a> {
    pub fn new(steps: &'a [StepInterval]) -> Self {
        Self { steps }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// RFC 3339 in UTC with a `Z` suffix; sub-second digits only when present.
fn serialize_instant<S: Serializer>(instant: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&instant.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}
