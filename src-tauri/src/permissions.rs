//! Permission gate — fail-closed wrapper over the platform grant API.
//!
//! Any doubt about grants (service unavailable, query error) reads as
//! "not granted", and no consent prompt is opened unless the service is usable.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::health_store::{HealthAvailability, PermissionController};
use crate::models::PermissionSet;

#[derive(Clone)]
pub struct PermissionGate {
    controller: Arc<dyn PermissionController>,
}

impl PermissionGate {
    pub fn new(controller: Arc<dyn PermissionController>) -> Self {
        Self { controller }
    }

    pub fn availability(&self) -> HealthAvailability {
        self.controller.availability()
    }

    /// True iff every required id is currently granted. Read-only.
    pub fn has_all_permissions(&self, required: &PermissionSet) -> bool {
        let availability = self.controller.availability();
        if !availability.is_available() {
            tracing::debug!(?availability, "Health service unusable, treating grants as missing");
            return false;
        }

        match self.controller.granted_permissions() {
            Ok(granted) => {
                let missing = required.missing_from(&granted);
                if !missing.is_empty() {
                    tracing::debug!(missing = ?missing, "Health permissions missing");
                }
                missing.is_empty()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read granted health permissions");
                false
            }
        }
    }

    /// Open the consent prompt and return what the user granted.
    ///
    /// Returns an empty set without prompting when the service is unusable,
    /// and an empty set when the prompt itself fails.
    pub fn request_permissions(&self, required: &PermissionSet) -> BTreeSet<String> {
        let availability = self.controller.availability();
        if !availability.is_available() {
            tracing::warn!(?availability, "Not requesting health permissions: service unusable");
            return BTreeSet::new();
        }

        match self.controller.request_permissions(required) {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!(error = %e, "Health permission request failed");
                BTreeSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHealthStore;

    fn gate(store: MockHealthStore) -> (PermissionGate, Arc<MockHealthStore>) {
        let store = Arc::new(store);
        (PermissionGate::new(store.clone()), store)
    }

    #[test]
    fn all_granted_is_true() {
        let (gate, _) = gate(MockHealthStore::new().granting_all());
        assert!(gate.has_all_permissions(&PermissionSet::step_sync()));
    }

    #[test]
    fn partial_grant_is_false() {
        let mut partial = PermissionSet::step_sync().as_set().clone();
        partial.remove("android.permission.health.READ_EXERCISE");
        let (gate, _) = gate(MockHealthStore::new().with_granted(partial));
        assert!(!gate.has_all_permissions(&PermissionSet::step_sync()));
    }

    #[test]
    fn grant_query_error_fails_closed() {
        let (gate, _) = gate(MockHealthStore::new().granting_all().failing_grants("binder died"));
        assert!(!gate.has_all_permissions(&PermissionSet::step_sync()));
    }

    #[test]
    fn unavailable_service_fails_closed() {
        let (gate, store) = gate(
            MockHealthStore::new()
                .granting_all()
                .with_availability(HealthAvailability::NotInstalled),
        );
        assert!(!gate.has_all_permissions(&PermissionSet::step_sync()));
        assert!(gate.request_permissions(&PermissionSet::step_sync()).is_empty());
        assert_eq!(store.request_calls(), 0);
    }

    #[test]
    fn request_returns_platform_answer() {
        let (gate, store) = gate(MockHealthStore::new().answering_consent_with_all());
        let granted = gate.request_permissions(&PermissionSet::step_sync());
        assert_eq!(granted.len(), 7);
        assert_eq!(store.request_calls(), 1);
    }

    #[test]
    fn failed_request_grants_nothing() {
        let (gate, _) = gate(MockHealthStore::new().failing_consent());
        assert!(gate.request_permissions(&PermissionSet::step_sync()).is_empty());
    }
}
