use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::enums::{AccessMode, HealthRecordType, UnknownValue};

/// Prefix shared by every health-data capability identifier on the platform.
pub const PERMISSION_PREFIX: &str = "android.permission.health.";

/// A single capability grant: one record type, one access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HealthPermission {
    pub access: AccessMode,
    pub record: HealthRecordType,
}

impl HealthPermission {
    pub const fn read(record: HealthRecordType) -> Self {
        Self { access: AccessMode::Read, record }
    }

    pub const fn write(record: HealthRecordType) -> Self {
        Self { access: AccessMode::Write, record }
    }

    /// Platform identifier, e.g. `android.permission.health.WRITE_STEPS`.
    pub fn id(&self) -> String {
        format!(
            "{PERMISSION_PREFIX}{}_{}",
            self.access.as_str(),
            self.record.as_str()
        )
    }
}

impl fmt::Display for HealthPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl FromStr for HealthPermission {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownValue {
            field: "HealthPermission".into(),
            value: s.into(),
        };
        let rest = s.strip_prefix(PERMISSION_PREFIX).ok_or_else(unknown)?;
        let (access, record) = rest.split_once('_').ok_or_else(unknown)?;
        Ok(Self {
            access: access.parse()?,
            record: record.parse()?,
        })
    }
}

/// The grants the step sync asks for. Fixed for the process lifetime.
pub const STEP_SYNC_PERMISSIONS: [HealthPermission; 7] = [
    HealthPermission::write(HealthRecordType::ExerciseSession),
    HealthPermission::read(HealthRecordType::ExerciseSession),
    HealthPermission::write(HealthRecordType::Steps),
    HealthPermission::write(HealthRecordType::Speed),
    HealthPermission::write(HealthRecordType::Distance),
    HealthPermission::write(HealthRecordType::TotalCaloriesBurned),
    HealthPermission::write(HealthRecordType::HeartRate),
];

/// A set of capability identifiers, as exchanged with the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    /// The required set for a step sync.
    pub fn step_sync() -> Self {
        STEP_SYNC_PERMISSIONS.iter().map(HealthPermission::id).collect()
    }

    /// True iff every id in `self` is present in `granted`.
    pub fn is_satisfied_by(&self, granted: &BTreeSet<String>) -> bool {
        self.0.is_subset(granted)
    }

    /// Ids in `self` that `granted` lacks.
    pub fn missing_from(&self, granted: &BTreeSet<String>) -> Vec<String> {
        self.0.difference(granted).cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.0
    }
}

impl FromIterator<String> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
