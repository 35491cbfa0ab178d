//! Download/export form of a credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use credo_core::{CredentialStatus, Did};

use crate::credential::{Claims, VerifiableCredential};
use crate::error::CredentialError;

/// `{id, type, issuer, subject, issuedDate, expiryDate?, status, data, signature}`.
///
/// `status` is a snapshot for display; importing ignores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialExport {
    pub id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub issuer: Did,
    pub subject: Did,
    pub issued_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    pub status: CredentialStatus,
    pub data: Claims,
    pub signature: String,
}

impl VerifiableCredential {
    /// Export with a status snapshot.
    pub fn to_export(&self, status: CredentialStatus) -> CredentialExport {
        CredentialExport {
            id: self.id.clone(),
            credential_type: self.credential_type.clone(),
            issuer: self.issuer.clone(),
            subject: self.subject.clone(),
            issued_date: self.issued_date,
            expiry_date: self.expiry_date,
            status,
            data: self.claims.clone(),
            signature: self.signature.clone(),
        }
    }

    /// Pretty-printed export JSON.
    pub fn export_json(&self, status: CredentialStatus) -> Result<String, CredentialError> {
        Ok(serde_json::to_string_pretty(&self.to_export(status))?)
    }

    /// Rebuild a credential from its export form.
    pub fn from_export(export: CredentialExport) -> Result<Self, CredentialError> {
        if export.signature.is_empty() {
            return Err(CredentialError::InvalidExport("missing signature".into()));
        }
        Ok(Self {
            id: export.id,
            credential_type: export.credential_type,
            issuer: export.issuer,
            subject: export.subject,
            issued_date: export.issued_date,
            expiry_date: export.expiry_date,
            claims: export.data,
            signature: export.signature,
        })
    }

    /// Parse export JSON.
    pub fn import_json(json: &str) -> Result<Self, CredentialError> {
        let export: CredentialExport = serde_json::from_str(json)?;
        Self::from_export(export)
    }
}
