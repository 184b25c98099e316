//! Live endpoint client — one authenticated JSON POST per sync.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use crate::config::SyncConfig;
use crate::models::{StepInterval, StepPayload};

/// Connect timeout. The request itself keeps the transport default.
const CONNECT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Non-2xx answer from the endpoint.
    #[error("Failed: {status} {reason}")]
    Rejected { status: u16, reason: String },

    /// Connection, TLS, or I/O fault before a status line was read.
    #[error("{0}")]
    Transport(String),

    #[error("Failed to encode step payload: {0}")]
    Encode(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Status of an accepted upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostResponse {
    pub status: u16,
}

/// Destination for a day's step intervals.
pub trait StepSink: Send + Sync {
    fn post_steps(&self, steps: &[StepInterval]) -> Result<PostResponse, UploadError>;
}

/// Blocking HTTP client for the live endpoint.
///
/// Build and drop on a blocking thread; the blocking client owns its own
/// runtime and must not be dropped inside an async task.
pub struct LiveEndpointClient {
    endpoint: String,
    bearer_token: String,
    client: reqwest::blocking::Client,
}

impl LiveEndpointClient {
    pub fn new(endpoint: &str, bearer_token: &str) -> Result<Self, UploadError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| UploadError::Client(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            bearer_token: bearer_token.to_string(),
            client,
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, UploadError> {
        Self::new(&config.endpoint, &config.bearer_token)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl StepSink for LiveEndpointClient {
    fn post_steps(&self, steps: &[StepInterval]) -> Result<PostResponse, UploadError> {
        let body = StepPayload::new(steps)
            .to_json()
            .map_err(|e| UploadError::Encode(e.to_string()))?;

        tracing::info!(endpoint = %self.endpoint, intervals = steps.len(), "Posting step data");

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.bearer_token))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    UploadError::Transport(format!("Cannot connect to {}: {e}", self.endpoint))
                } else if e.is_timeout() {
                    UploadError::Transport(format!("Request to {} timed out", self.endpoint))
                } else {
                    UploadError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(status = status.as_u16(), "Step data accepted");
            return Ok(PostResponse {
                status: status.as_u16(),
            });
        }

        let reason = status.canonical_reason().unwrap_or("Unknown Status").to_string();
        tracing::warn!(status = status.as_u16(), %reason, "Step data rejected");
        Err(UploadError::Rejected {
            status: status.as_u16(),
            reason,
        })
    }
}
