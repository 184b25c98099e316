//! Test doubles shared by the unit tests.

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::routing::post;
use axum::Router;
use chrono::{DateTime, NaiveDate, Utc};

use crate::health_store::{
    DayWindow, HealthAvailability, HealthRecordsClient, HealthStoreError, PermissionController,
};
use crate::models::{PermissionSet, StepInterval, StepRecord};
use crate::uploader::{PostResponse, StepSink, UploadError};

// ── Fixtures ────────────────────────────────────────────

pub fn instant(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn record(start: &str, end: &str, count: u64) -> StepRecord {
    StepRecord {
        id: None,
        start_time: instant(start),
        start_zone_offset_secs: None,
        end_time: instant(end),
        end_zone_offset_secs: None,
        count,
        data_origin: "com.example.tracker".into(),
    }
}

pub fn interval(start: &str, end: &str, count: u64) -> StepInterval {
    StepInterval {
        start_time: instant(start),
        end_time: instant(end),
        count,
    }
}

pub fn utc_window(date: &str) -> DayWindow {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    DayWindow::for_date(date, &Utc)
}

// ── MockHealthStore ─────────────────────────────────────

enum ConsentAnswer {
    Grant(BTreeSet<String>),
    Fail,
}

/// Scripted platform store that counts calls.
pub struct MockHealthStore {
    availability: HealthAvailability,
    granted: BTreeSet<String>,
    grants_error: Option<String>,
    consent: ConsentAnswer,
    records: Vec<StepRecord>,
    records_error: Option<String>,
    total: Option<u64>,
    total_error: Option<String>,
    request_calls: AtomicUsize,
    read_calls: AtomicUsize,
    aggregate_calls: AtomicUsize,
}

impl MockHealthStore {
    pub fn new() -> Self {
        Self {
            availability: HealthAvailability::Available,
            granted: BTreeSet::new(),
            grants_error: None,
            consent: ConsentAnswer::Grant(BTreeSet::new()),
            records: Vec::new(),
            records_error: None,
            total: None,
            total_error: None,
            request_calls: AtomicUsize::new(0),
            read_calls: AtomicUsize::new(0),
            aggregate_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_availability(mut self, availability: HealthAvailability) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_granted(mut self, granted: BTreeSet<String>) -> Self {
        self.granted = granted;
        self
    }

    pub fn granting_all(self) -> Self {
        self.with_granted(PermissionSet::step_sync().as_set().clone())
    }

    pub fn failing_grants(mut self, message: &str) -> Self {
        self.grants_error = Some(message.into());
        self
    }

    pub fn answering_consent_with(mut self, granted: BTreeSet<String>) -> Self {
        self.consent = ConsentAnswer::Grant(granted);
        self
    }

    pub fn answering_consent_with_all(self) -> Self {
        self.answering_consent_with(PermissionSet::step_sync().as_set().clone())
    }

    pub fn failing_consent(mut self) -> Self {
        self.consent = ConsentAnswer::Fail;
        self
    }

    pub fn with_records(mut self, records: Vec<StepRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn failing_records(mut self, message: &str) -> Self {
        self.records_error = Some(message.into());
        self
    }

    pub fn with_total(mut self, total: Option<u64>) -> Self {
        self.total = total;
        self
    }

    pub fn failing_total(mut self, message: &str) -> Self {
        self.total_error = Some(message.into());
        self
    }

    pub fn request_calls(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn aggregate_calls(&self) -> usize {
        self.aggregate_calls.load(Ordering::SeqCst)
    }
}

impl PermissionController for MockHealthStore {
    fn availability(&self) -> HealthAvailability {
        self.availability
    }

    fn granted_permissions(&self) -> Result<BTreeSet<String>, HealthStoreError> {
        match &self.grants_error {
            Some(message) => Err(HealthStoreError::Query(message.clone())),
            None => Ok(self.granted.clone()),
        }
    }

    fn request_permissions(
        &self,
        _required: &PermissionSet,
    ) -> Result<BTreeSet<String>, HealthStoreError> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        match &self.consent {
            ConsentAnswer::Grant(granted) => Ok(granted.clone()),
            ConsentAnswer::Fail => Err(HealthStoreError::Query("consent activity crashed".into())),
        }
    }
}

impl HealthRecordsClient for MockHealthStore {
    fn read_step_records(&self, _window: &DayWindow) -> Result<Vec<StepRecord>, HealthStoreError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        match &self.records_error {
            Some(message) => Err(HealthStoreError::Query(message.clone())),
            None => Ok(self.records.clone()),
        }
    }

    fn aggregate_step_total(&self, _window: &DayWindow) -> Result<Option<u64>, HealthStoreError> {
        self.aggregate_calls.fetch_add(1, Ordering::SeqCst);
        match &self.total_error {
            Some(message) => Err(HealthStoreError::Query(message.clone())),
            None => Ok(self.total),
        }
    }
}

// ── MockStepSink ────────────────────────────────────────

enum SinkAnswer {
    Status(u16, String),
    Transport(String),
}

/// Endpoint double that records every payload it receives.
pub struct MockStepSink {
    answer: SinkAnswer,
    posted: Mutex<Vec<Vec<StepInterval>>>,
}

impl MockStepSink {
    pub fn accepting(status: u16) -> Self {
        Self::answering(SinkAnswer::Status(status, "OK".into()))
    }

    pub fn rejecting(status: u16, reason: &str) -> Self {
        Self::answering(SinkAnswer::Status(status, reason.into()))
    }

    pub fn unreachable(message: &str) -> Self {
        Self::answering(SinkAnswer::Transport(message.into()))
    }

    fn answering(answer: SinkAnswer) -> Self {
        Self {
            answer,
            posted: Mutex::new(Vec::new()),
        }
    }

    pub fn posted(&self) -> Vec<Vec<StepInterval>> {
        self.posted.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.posted.lock().unwrap().len()
    }
}

impl StepSink for MockStepSink {
    fn post_steps(&self, steps: &[StepInterval]) -> Result<PostResponse, UploadError> {
        self.posted.lock().unwrap().push(steps.to_vec());
        match &self.answer {
            SinkAnswer::Status(status, _) if (200..300).contains(status) => {
                Ok(PostResponse { status: *status })
            }
            SinkAnswer::Status(status, reason) => Err(UploadError::Rejected {
                status: *status,
                reason: reason.clone(),
            }),
            SinkAnswer::Transport(message) => Err(UploadError::Transport(message.clone())),
        }
    }
}

// ── Local capture server ────────────────────────────────

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// axum server on `127.0.0.1:0` answering `POST /live` with a fixed status.
pub struct CaptureServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl CaptureServer {
    pub fn url(&self) -> String {
        format!("http://{}/live", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn spawn_capture_server(status: StatusCode) -> CaptureServer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&requests);

    let app = Router::new().route(
        "/live",
        post(move |headers: HeaderMap, body: String| {
            let captured = Arc::clone(&captured);
            async move {
                let header = |name: HeaderName| {
                    headers
                        .get(name)
                        .and_then(|v| v.to_str().ok())
                        .map(String::from)
                };
                captured.lock().unwrap().push(CapturedRequest {
                    authorization: header(AUTHORIZATION),
                    content_type: header(CONTENT_TYPE),
                    body,
                });
                status
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    CaptureServer { addr, requests }
}
