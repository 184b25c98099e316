use serde::{Deserialize, Serialize};

/// Terminal value of one sync attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncOutcome {
    Success { http_status: u16, message: String },
    Failure { reason: String },
}

impl SyncOutcome {
    pub fn success(http_status: u16) -> Self {
        Self::Success {
            http_status,
            message: format!("Success: {http_status}"),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The line shown to the user.
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } => message,
            Self::Failure { reason } => reason,
        }
    }
}
