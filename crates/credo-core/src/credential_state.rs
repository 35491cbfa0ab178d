use crate::error::CoreError;
use crate::types::CredentialStatus;

/// Events that drive credential status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialEvent {
    /// A verification attempt succeeded on an unexpired credential.
    VerificationSucceeded,
    /// A verification attempt returned a failure verdict.
    VerificationFailed,
    /// The credential's expiry timestamp was reached.
    ExpiryReached,
}

impl CredentialEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::VerificationSucceeded => "verification-succeeded",
            Self::VerificationFailed => "verification-failed",
            Self::ExpiryReached => "expiry-reached",
        }
    }
}

/// Manages credential status transitions.
///
/// Valid transitions:
/// - Pending → Verified (VerificationSucceeded)
/// - Pending → Pending (VerificationFailed)
/// - Verified → Verified (VerificationSucceeded)
/// - Verified → Pending (VerificationFailed)
/// - Pending | Verified → Expired (ExpiryReached)
/// - Expired → Expired (ExpiryReached)
///
/// `Expired` is terminal: no verification outcome can move a credential
/// out of it, even if the clock that triggered it is later corrected.
pub struct CredentialStateMachine;

impl CredentialStateMachine {
    /// Attempt a status transition based on an event.
    /// Returns the new status on success, or an error for invalid transitions.
    pub fn transition(
        current: CredentialStatus,
        event: CredentialEvent,
    ) -> Result<CredentialStatus, CoreError> {
        let next = match (current, event) {
            (CredentialStatus::Pending, CredentialEvent::VerificationSucceeded) => {
                CredentialStatus::Verified
            }
            (CredentialStatus::Pending, CredentialEvent::VerificationFailed) => {
                CredentialStatus::Pending
            }
            (CredentialStatus::Verified, CredentialEvent::VerificationSucceeded) => {
                CredentialStatus::Verified
            }
            (CredentialStatus::Verified, CredentialEvent::VerificationFailed) => {
                CredentialStatus::Pending
            }
            (_, CredentialEvent::ExpiryReached) => CredentialStatus::Expired,
            (CredentialStatus::Expired, _) => {
                return Err(CoreError::InvalidStatusTransition {
                    from: current,
                    event: event.name(),
                });
            }
        };

        if next != current {
            tracing::debug!(
                from = %current,
                to = %next,
                event = ?event,
                "credential status transition"
            );
        }

        Ok(next)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: CredentialStatus, event: CredentialEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
