use serde::{Deserialize, Serialize};

/// Error for identifiers the platform hands back that this app does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {field} value: {value}")]
pub struct UnknownValue {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(UnknownValue {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Suffixes match the platform permission names, e.g. `WRITE_TOTAL_CALORIES_BURNED`.
str_enum!(HealthRecordType {
    ExerciseSession => "EXERCISE",
    Steps => "STEPS",
    Speed => "SPEED",
    Distance => "DISTANCE",
    TotalCaloriesBurned => "TOTAL_CALORIES_BURNED",
    HeartRate => "HEART_RATE",
});

str_enum!(AccessMode {
    Read => "READ",
    Write => "WRITE",
});
