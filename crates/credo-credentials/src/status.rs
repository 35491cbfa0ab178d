use chrono::{DateTime, Utc};
use dashmap::DashMap;

use credo_core::{CoreError, CredentialEvent, CredentialStateMachine, CredentialStatus};

use crate::credential::VerifiableCredential;

/// Last verification verdict per credential.
///
/// Verdicts are keyed by [`VerifiableCredential::fingerprint`], not by id,
/// so a copy with altered claims or signature starts from `pending`. The
/// status a caller sees is always recomputed by [`current_status`] so it
/// cannot drift from expiry.
#[derive(Default)]
pub struct StatusTracker {
    statuses: DashMap<String, CredentialStatus>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded status for a credential, if any.
    pub fn last(&self, credential: &VerifiableCredential) -> Option<CredentialStatus> {
        let key = credential.fingerprint().ok()?;
        self.statuses.get(&key).map(|s| *s)
    }

    /// Apply an event to a credential's recorded status.
    ///
    /// Verification events on an expired credential are rejected.
    pub fn record(
        &self,
        credential: &VerifiableCredential,
        event: CredentialEvent,
    ) -> Result<CredentialStatus, CoreError> {
        let key = credential.fingerprint()?;
        let mut slot = self
            .statuses
            .entry(key)
            .or_insert(CredentialStatus::Pending);
        let next = CredentialStateMachine::transition(*slot, event)?;
        *slot = next;
        Ok(next)
    }

    /// Forget a credential.
    pub fn forget(&self, credential: &VerifiableCredential) -> bool {
        match credential.fingerprint() {
            Ok(key) => self.statuses.remove(&key).is_some(),
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

/// Status of a credential at `now`.
///
/// `expired` once `now` reaches the expiry (or once expiry has ever been
/// recorded), otherwise the last verdict, or `pending` if never verified.
pub fn current_status(
    credential: &VerifiableCredential,
    tracker: &StatusTracker,
    now: DateTime<Utc>,
) -> CredentialStatus {
    if credential.is_expired_at(now) {
        return CredentialStatus::Expired;
    }
    tracker
        .last(credential)
        .unwrap_or(CredentialStatus::Pending)
}
