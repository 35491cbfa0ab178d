use chrono::{DateTime, Utc};

use credo_core::Did;
use credo_crypto::{sign, KeyPair};

use crate::credential::{Claims, VerifiableCredential};
use crate::error::CredentialError;

/// Issues verifiable credentials signed by the issuer's key pair.
pub struct CredentialIssuer {
    /// DID of the issuer.
    did: Did,
    /// Issuer's signing key pair.
    keypair: KeyPair,
}

impl CredentialIssuer {
    /// Create a new credential issuer.
    pub fn new(did: Did, keypair: KeyPair) -> Self {
        Self { did, keypair }
    }

    /// Get the issuer's DID.
    pub fn did(&self) -> &Did {
        &self.did
    }

    /// Issue a credential at the current time.
    ///
    /// An expiry already in the past is accepted; such a credential
    /// verifies as expired.
    pub fn issue(
        &self,
        subject: &Did,
        credential_type: &str,
        claims: Claims,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<VerifiableCredential, CredentialError> {
        self.issue_at(subject, credential_type, claims, expiry, Utc::now())
    }

    /// Issue a credential with an explicit issuance time.
    pub fn issue_at(
        &self,
        subject: &Did,
        credential_type: &str,
        claims: Claims,
        expiry: Option<DateTime<Utc>>,
        issued_at: DateTime<Utc>,
    ) -> Result<VerifiableCredential, CredentialError> {
        if credential_type.trim().is_empty() {
            return Err(CredentialError::IssuanceFailed(
                "credential type must not be empty".into(),
            ));
        }

        let mut vc = VerifiableCredential::unsigned(
            self.did.clone(),
            subject.clone(),
            credential_type.to_string(),
            claims,
            issued_at,
            expiry,
        );
        let payload = vc.signing_payload()?;
        vc.signature = sign(&payload, &self.keypair)?.to_base64url();

        tracing::info!(
            issuer = %self.did,
            subject = %subject,
            credential_id = %vc.id,
            credential_type = %vc.credential_type,
            "credential issued"
        );

        Ok(vc)
    }
}
