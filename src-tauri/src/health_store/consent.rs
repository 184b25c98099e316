//! Consent broker — request/response bridge between a blocked sync and the
//! display surface that renders the consent prompt.
//!
//! `request()` publishes a `ConsentRequest` and blocks the calling (background)
//! thread until `resolve()` or `dismiss()` is called from the IPC side. Only
//! one prompt can be pending at a time.

use std::collections::BTreeSet;
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::{broadcast, oneshot};
use uuid::Uuid;

use crate::models::PermissionSet;

/// Prompt published to the display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsentRequest {
    pub request_id: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("A consent prompt is already open")]
    AlreadyPending,
    #[error("No display surface is listening for consent prompts")]
    NoListener,
    #[error("No open consent prompt with id {0}")]
    UnknownRequest(String),
}

struct PendingConsent {
    request_id: String,
    requested: BTreeSet<String>,
    reply: oneshot::Sender<BTreeSet<String>>,
}

pub struct ConsentBroker {
    pending: Mutex<Option<PendingConsent>>,
    requests: broadcast::Sender<ConsentRequest>,
}

impl ConsentBroker {
    pub fn new() -> Self {
        let (requests, _) = broadcast::channel(4);
        Self {
            pending: Mutex::new(None),
            requests,
        }
    }

    /// Receive every prompt published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsentRequest> {
        self.requests.subscribe()
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// The open prompt, if any. A display surface that missed the published
    /// request (reload, late start) reads it from here.
    pub fn pending_request(&self) -> Option<ConsentRequest> {
        let pending = self.pending.lock().ok()?;
        pending.as_ref().map(|open| ConsentRequest {
            request_id: open.request_id.clone(),
            permissions: open.requested.iter().cloned().collect(),
        })
    }

    /// Publish a prompt and block until it is answered.
    ///
    /// Must run on a blocking thread, never inside an async task. A dismissed
    /// prompt yields an empty set.
    pub fn request(&self, permissions: &PermissionSet) -> Result<BTreeSet<String>, ConsentError> {
        let (reply, answer) = oneshot::channel();
        let request_id = Uuid::new_v4().to_string();

        {
            let mut pending = self.pending.lock().map_err(|_| ConsentError::LockPoisoned)?;
            if pending.is_some() {
                return Err(ConsentError::AlreadyPending);
            }
            *pending = Some(PendingConsent {
                request_id: request_id.clone(),
                requested: permissions.as_set().clone(),
                reply,
            });
        }

        let prompt = ConsentRequest {
            request_id: request_id.clone(),
            permissions: permissions.to_vec(),
        };
        if self.requests.send(prompt).is_err() {
            self.clear();
            return Err(ConsentError::NoListener);
        }

        tracing::info!(request = %request_id, "Waiting for health data consent");
        match answer.blocking_recv() {
            Ok(granted) => {
                tracing::info!(request = %request_id, granted = granted.len(), "Consent answered");
                Ok(granted)
            }
            Err(_) => {
                tracing::info!(request = %request_id, "Consent prompt dismissed");
                Ok(BTreeSet::new())
            }
        }
    }

    /// Answer the open prompt. Ids that were not asked for are ignored.
    pub fn resolve(&self, request_id: &str, granted: Vec<String>) -> Result<(), ConsentError> {
        let pending = self.take(request_id)?;
        let granted: BTreeSet<String> = granted
            .into_iter()
            .filter(|id| pending.requested.contains(id))
            .collect();
        // A requester that has gone away no longer cares about the answer.
        let _ = pending.reply.send(granted);
        Ok(())
    }

    /// Close the open prompt without granting anything.
    pub fn dismiss(&self, request_id: &str) -> Result<(), ConsentError> {
        drop(self.take(request_id)?);
        Ok(())
    }

    fn take(&self, request_id: &str) -> Result<PendingConsent, ConsentError> {
        let mut pending = self.pending.lock().map_err(|_| ConsentError::LockPoisoned)?;
        match pending.take() {
            Some(open) if open.request_id == request_id => Ok(open),
            other => {
                *pending = other;
                Err(ConsentError::UnknownRequest(request_id.to_string()))
            }
        }
    }

    fn clear(&self) {
        if let Ok(mut pending) = self.pending.lock() {
            *pending = None;
        }
    }
}

impl Default for ConsentBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn ask(broker: &Arc<ConsentBroker>) -> thread::JoinHandle<Result<BTreeSet<String>, ConsentError>> {
        let broker = Arc::clone(broker);
        thread::spawn(move || broker.request(&PermissionSet::step_sync()))
    }

    #[test]
    fn request_without_listener_fails() {
        let broker = ConsentBroker::new();
        let err = broker.request(&PermissionSet::step_sync()).unwrap_err();
        assert!(matches!(err, ConsentError::NoListener));
        assert!(!broker.has_pending());
    }

    #[test]
    fn resolve_delivers_granted_ids() {
        let broker = Arc::new(ConsentBroker::new());
        let mut prompts = broker.subscribe();
        let asker = ask(&broker);

        let prompt = prompts.blocking_recv().unwrap();
        assert_eq!(prompt.permissions.len(), 7);
        broker.resolve(&prompt.request_id, prompt.permissions.clone()).unwrap();

        let granted = asker.join().unwrap().unwrap();
        assert_eq!(granted.len(), 7);
        assert!(!broker.has_pending());
    }

    #[test]
    fn unrequested_ids_are_dropped() {
        let broker = Arc::new(ConsentBroker::new());
        let mut prompts = broker.subscribe();
        let asker = ask(&broker);

        let prompt = prompts.blocking_recv().unwrap();
        broker
            .resolve(
                &prompt.request_id,
                vec![
                    "android.permission.health.WRITE_STEPS".into(),
                    "android.permission.health.READ_SLEEP".into(),
                ],
            )
            .unwrap();

        let granted = asker.join().unwrap().unwrap();
        assert_eq!(granted.len(), 1);
        assert!(granted.contains("android.permission.health.WRITE_STEPS"));
    }

    #[test]
    fn dismiss_yields_empty_grant() {
        let broker = Arc::new(ConsentBroker::new());
        let mut prompts = broker.subscribe();
        let asker = ask(&broker);

        let prompt = prompts.blocking_recv().unwrap();
        broker.dismiss(&prompt.request_id).unwrap();

        assert!(asker.join().unwrap().unwrap().is_empty());
    }

    #[test]
    fn wrong_request_id_keeps_prompt_open() {
        let broker = Arc::new(ConsentBroker::new());
        let mut prompts = broker.subscribe();
        let asker = ask(&broker);

        let prompt = prompts.blocking_recv().unwrap();
        let err = broker.resolve("not-the-id", vec![]).unwrap_err();
        assert!(matches!(err, ConsentError::UnknownRequest(_)));
        assert!(broker.has_pending());

        broker.dismiss(&prompt.request_id).unwrap();
        asker.join().unwrap().unwrap();
    }

    #[test]
    fn open_prompt_can_be_read_back() {
        let broker = Arc::new(ConsentBroker::new());
        assert!(broker.pending_request().is_none());

        let mut prompts = broker.subscribe();
        let asker = ask(&broker);
        let published = prompts.blocking_recv().unwrap();

        assert_eq!(broker.pending_request(), Some(published.clone()));

        broker.dismiss(&published.request_id).unwrap();
        asker.join().unwrap().unwrap();
        assert!(broker.pending_request().is_none());
    }

    #[test]
    fn second_request_while_open_is_rejected() {
        let broker = Arc::new(ConsentBroker::new());
        let mut prompts = broker.subscribe();
        let asker = ask(&broker);
        let prompt = prompts.blocking_recv().unwrap();

        let err = broker.request(&PermissionSet::step_sync()).unwrap_err();
        assert!(matches!(err, ConsentError::AlreadyPending));

        broker.dismiss(&prompt.request_id).unwrap();
        asker.join().unwrap().unwrap();
    }
}
