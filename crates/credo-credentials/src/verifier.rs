use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use credo_core::{CredentialEvent, CredentialStatus};
use credo_crypto::{verify, PublicKey};
use credo_identity::{DidResolver, IdentityDocument, IdentityError};

use crate::credential::VerifiableCredential;
use crate::status::{current_status, StatusTracker};

/// Verdict of a verification attempt. Verification never fails with an
/// error; every failure mode is one of these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum VerificationOutcome {
    /// Signature verified under the given assertion method.
    Valid { method_id: String },
    /// The expiry timestamp has passed. Nothing else was checked.
    Expired,
    /// The issuer's identity document could not be obtained.
    IssuerUnresolvable { reason: String },
    /// The issuer's document lists no usable assertion method.
    IssuerKeyNotFound,
    /// The revocation check reported the credential as revoked.
    Revoked,
    /// No assertion method verifies the signature over the payload.
    SignatureMismatch,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// The status-machine event this verdict produces.
    pub fn event(&self) -> CredentialEvent {
        match self {
            Self::Valid { .. } => CredentialEvent::VerificationSucceeded,
            Self::Expired => CredentialEvent::ExpiryReached,
            _ => CredentialEvent::VerificationFailed,
        }
    }
}

impl std::fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid { method_id } => write!(f, "valid ({})", method_id),
            Self::Expired => write!(f, "expired"),
            Self::IssuerUnresolvable { reason } => write!(f, "issuer unresolvable: {}", reason),
            Self::IssuerKeyNotFound => write!(f, "issuer key not found"),
            Self::Revoked => write!(f, "revoked"),
            Self::SignatureMismatch => write!(f, "signature mismatch"),
        }
    }
}

/// Revocation lookup consulted after the issuer key is found and before
/// the signature is checked.
pub trait RevocationCheck: Send + Sync {
    fn is_revoked(&self, credential: &VerifiableCredential) -> bool;
}

/// Nothing is ever revoked.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRevocation;

impl RevocationCheck for NoRevocation {
    fn is_revoked(&self, _credential: &VerifiableCredential) -> bool {
        false
    }
}

/// Verifies credentials against their issuer's identity document.
///
/// Holds no mutable state; concurrent calls are independent.
#[derive(Clone)]
pub struct VerificationEngine {
    revocation: Arc<dyn RevocationCheck>,
}

impl Default for VerificationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationEngine {
    /// Engine with no revocation mechanism.
    pub fn new() -> Self {
        Self {
            revocation: Arc::new(NoRevocation),
        }
    }

    /// Engine consulting `revocation` for every credential.
    pub fn with_revocation(revocation: Arc<dyn RevocationCheck>) -> Self {
        Self { revocation }
    }

    /// Verify a credential, resolving the issuer through `resolver`.
    ///
    /// An expired credential short-circuits before any resolution.
    pub async fn verify<R>(
        &self,
        credential: &VerifiableCredential,
        resolver: &R,
        now: DateTime<Utc>,
    ) -> VerificationOutcome
    where
        R: DidResolver + ?Sized,
    {
        if credential.is_expired_at(now) {
            return VerificationOutcome::Expired;
        }
        let resolved = resolver.resolve(&credential.issuer).await;
        self.verify_with_document(credential, resolved.as_ref(), now)
    }

    /// Verify a credential against an already resolved issuer document.
    pub fn verify_with_document(
        &self,
        credential: &VerifiableCredential,
        document: Result<&IdentityDocument, &IdentityError>,
        now: DateTime<Utc>,
    ) -> VerificationOutcome {
        let outcome = self.evaluate(credential, document, now);
        tracing::debug!(
            credential_id = %credential.id,
            issuer = %credential.issuer,
            outcome = %outcome,
            "credential verified"
        );
        outcome
    }

    fn evaluate(
        &self,
        credential: &VerifiableCredential,
        document: Result<&IdentityDocument, &IdentityError>,
        now: DateTime<Utc>,
    ) -> VerificationOutcome {
        if credential.is_expired_at(now) {
            return VerificationOutcome::Expired;
        }

        let document = match document {
            Ok(doc) => doc,
            Err(e) => {
                return VerificationOutcome::IssuerUnresolvable {
                    reason: e.to_string(),
                }
            }
        };
        if document.id != credential.issuer {
            return VerificationOutcome::IssuerUnresolvable {
                reason: format!("resolved document is for {}", document.id),
            };
        }

        let keys: Vec<(&str, PublicKey)> = document
            .assertion_methods()
            .filter_map(|vm| vm.public_key().ok().map(|pk| (vm.id.as_str(), pk)))
            .collect();
        if keys.is_empty() {
            return VerificationOutcome::IssuerKeyNotFound;
        }

        if self.revocation.is_revoked(credential) {
            return VerificationOutcome::Revoked;
        }

        let decoded = (credential.signing_payload(), credential.decode_signature());
        let (payload, signature) = match decoded {
            (Ok(payload), Ok(signature)) => (payload, signature),
            _ => return VerificationOutcome::SignatureMismatch,
        };

        keys.into_iter()
            .find(|(_, key)| verify(&payload, &signature, key))
            .map(|(method_id, _)| VerificationOutcome::Valid {
                method_id: method_id.to_string(),
            })
            .unwrap_or(VerificationOutcome::SignatureMismatch)
    }

    /// Verify and record the verdict in `tracker`.
    ///
    /// A credential already recorded as expired stays expired and is not
    /// re-checked.
    pub async fn verify_and_track<R>(
        &self,
        credential: &VerifiableCredential,
        resolver: &R,
        tracker: &StatusTracker,
        now: DateTime<Utc>,
    ) -> (VerificationOutcome, CredentialStatus)
    where
        R: DidResolver + ?Sized,
    {
        if tracker.last(credential) == Some(CredentialStatus::Expired) {
            return (VerificationOutcome::Expired, CredentialStatus::Expired);
        }

        let outcome = self.verify(credential, resolver, now).await;
        let status = match tracker.record(credential, outcome.event()) {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!(credential_id = %credential.id, error = %e, "verdict not recorded");
                current_status(credential, tracker, now)
            }
        };

        tracing::info!(
            credential_id = %credential.id,
            outcome = %outcome,
            status = %status,
            "credential status updated"
        );
        (outcome, status)
    }
}
