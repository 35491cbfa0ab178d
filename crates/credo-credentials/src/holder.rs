use chrono::{DateTime, Utc};
use dashmap::DashMap;

use credo_core::{CredentialStatus, Did};

use crate::credential::VerifiableCredential;
use crate::error::CredentialError;
use crate::status::{current_status, StatusTracker};

/// Credential wallet for a holder: stores and manages verifiable credentials.
///
/// Removing a credential only drops it from this collection; it does not
/// revoke the underlying claim.
pub struct CredentialWallet {
    /// DID of the wallet owner.
    owner_did: Did,
    /// Credential ID → VerifiableCredential.
    credentials: DashMap<String, VerifiableCredential>,
}

impl CredentialWallet {
    /// Create a new credential wallet.
    pub fn new(owner_did: Did) -> Self {
        Self {
            owner_did,
            credentials: DashMap::new(),
        }
    }

    /// Get the wallet owner's DID.
    pub fn owner_did(&self) -> &Did {
        &self.owner_did
    }

    /// Store a credential in the wallet.
    pub fn store(&self, credential: VerifiableCredential) -> Result<(), CredentialError> {
        if credential.subject != self.owner_did {
            return Err(CredentialError::SubjectMismatch {
                subject: credential.subject,
                owner: self.owner_did.clone(),
            });
        }
        let id = credential.id.clone();
        self.credentials.insert(id.clone(), credential);
        tracing::debug!(credential_id = %id, "credential stored in wallet");
        Ok(())
    }

    /// Get a credential by ID.
    pub fn get(&self, id: &str) -> Option<VerifiableCredential> {
        self.credentials.get(id).map(|e| e.clone())
    }

    /// List all credential IDs.
    pub fn list(&self) -> Vec<String> {
        self.credentials.iter().map(|e| e.key().clone()).collect()
    }

    /// List credentials by type.
    pub fn list_by_type(&self, credential_type: &str) -> Vec<VerifiableCredential> {
        self.credentials
            .iter()
            .filter(|e| e.credential_type == credential_type)
            .map(|e| e.value().clone())
            .collect()
    }

    /// Number of credentials in the wallet.
    pub fn count(&self) -> usize {
        self.credentials.len()
    }

    /// Check if the wallet is empty.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Remove a credential from the wallet.
    pub fn remove(&self, id: &str) -> Result<VerifiableCredential, CredentialError> {
        self.credentials
            .remove(id)
            .map(|(_, vc)| vc)
            .ok_or_else(|| CredentialError::CredentialNotFound(id.to_string()))
    }

    /// Current status of every credential, as `(id, status)` pairs.
    pub fn statuses(
        &self,
        tracker: &StatusTracker,
        now: DateTime<Utc>,
    ) -> Vec<(String, CredentialStatus)> {
        self.credentials
            .iter()
            .map(|e| (e.key().clone(), current_status(e.value(), tracker, now)))
            .collect()
    }

    /// Credentials that have not expired at `now`.
    pub fn active_credentials(&self, now: DateTime<Utc>) -> Vec<VerifiableCredential> {
        self.credentials
            .iter()
            .filter(|e| !e.is_expired_at(now))
            .map(|e| e.value().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use credo_core::CredentialEvent;
    use credo_crypto::KeyPair;

    use crate::credential::Claims;
    use crate::issuer::CredentialIssuer;

    fn alice() -> Did {
        Did::parse("did:key:zAlice").unwrap()
    }

    fn make_credential(
        subject: &Did,
        cred_type: &str,
        expiry: Option<DateTime<Utc>>,
    ) -> VerifiableCredential {
        let issuer = CredentialIssuer::new(
            Did::parse("did:key:zIssuer").unwrap(),
            KeyPair::generate().unwrap(),
        );
        let mut claims = Claims::new();
        claims.insert("test".into(), serde_json::json!(true));
        issuer.issue(subject, cred_type, claims, expiry).unwrap()
    }

    #[test]
    fn test_store_and_get() {
        let wallet = CredentialWallet::new(alice());
        let vc = make_credential(&alice(), "Education Certificate", None);
        let id = vc.id.clone();
        wallet.store(vc).unwrap();
        assert_eq!(wallet.count(), 1);
        assert!(wallet.get(&id).is_some());
    }

    #[test]
    fn test_store_wrong_subject() {
        let wallet = CredentialWallet::new(alice());
        let bob = Did::parse("did:key:zBob").unwrap();
        let vc = make_credential(&bob, "Education Certificate", None);
        assert!(matches!(
            wallet.store(vc),
            Err(CredentialError::SubjectMismatch { .. })
        ));
    }

    #[test]
    fn test_list_by_type() {
        let wallet = CredentialWallet::new(alice());
        wallet.store(make_credential(&alice(), "Education Certificate", None)).unwrap();
        wallet.store(make_credential(&alice(), "Employment", None)).unwrap();
        wallet.store(make_credential(&alice(), "Education Certificate", None)).unwrap();

        assert_eq!(wallet.list().len(), 3);
        assert_eq!(wallet.list_by_type("Education Certificate").len(), 2);
        assert_eq!(wallet.list_by_type("Employment").len(), 1);
        assert!(wallet.list_by_type("Unknown").is_empty());
    }

    #[test]
    fn test_remove() {
        let wallet = CredentialWallet::new(alice());
        let vc = make_credential(&alice(), "Education Certificate", None);
        let id = vc.id.clone();
        wallet.store(vc).unwrap();

        assert!(wallet.remove(&id).is_ok());
        assert!(wallet.is_empty());
        assert!(matches!(
            wallet.remove(&id),
            Err(CredentialError::CredentialNotFound(_))
        ));
    }

    #[test]
    fn test_statuses_and_active() {
        let wallet = CredentialWallet::new(alice());
        let tracker = StatusTracker::new();
        let now = Utc::now();

        let fresh = make_credential(&alice(), "A", None);
        let stale = make_credential(&alice(), "B", Some(now - Duration::days(1)));
        tracker.record(&fresh, CredentialEvent::VerificationSucceeded).unwrap();
        let fresh_id = fresh.id.clone();
        let stale_id = stale.id.clone();
        wallet.store(fresh).unwrap();
        wallet.store(stale).unwrap();

        let statuses: std::collections::HashMap<_, _> =
            wallet.statuses(&tracker, now).into_iter().collect();
        assert_eq!(statuses[&fresh_id], CredentialStatus::Verified);
        assert_eq!(statuses[&stale_id], CredentialStatus::Expired);

        let active = wallet.active_credentials(now);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, fresh_id);
    }
}
