use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use credo_core::{to_canonical_vec, CoreError, Did};
use credo_crypto::{CryptoError, Signature};

/// Claim name to claim value. Values may be scalars or nested structures.
pub type Claims = Map<String, Value>;

/// A signed claim issued by an issuer DID about a subject DID.
///
/// Claims and signature are immutable after issuance. Status is not part of
/// the credential; it is computed from expiry and verification verdicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// Unique credential identifier (`urn:uuid:<v7>`).
    pub id: String,
    /// Credential type (e.g., "Education Certificate").
    #[serde(rename = "type")]
    pub credential_type: String,
    /// DID of the issuer.
    pub issuer: Did,
    /// DID of the subject.
    pub subject: Did,
    /// When the credential was issued, at millisecond precision.
    pub issued_date: DateTime<Utc>,
    /// Optional expiry, at millisecond precision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    pub claims: Claims,
    /// ECDSA P-256 signature over the canonical payload, base64url.
    pub signature: String,
}

impl VerifiableCredential {
    /// Assemble an unsigned credential. Timestamps are truncated to
    /// milliseconds so the signed payload survives any JSON round trip.
    pub(crate) fn unsigned(
        issuer: Did,
        subject: Did,
        credential_type: String,
        claims: Claims,
        issued_date: DateTime<Utc>,
        expiry_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: format!("urn:uuid:{}", Uuid::now_v7()),
            credential_type,
            issuer,
            subject,
            issued_date: issued_date.trunc_subsecs(3),
            expiry_date: expiry_date.map(|d| d.trunc_subsecs(3)),
            claims,
            signature: String::new(),
        }
    }

    /// Canonical signing payload.
    ///
    /// A JSON object over `claims`, `expiry`, `issuanceDate`, `issuer`,
    /// `subject` and `type` with every map's keys sorted and no whitespace,
    /// so equal credentials always produce identical bytes.
    pub fn signing_payload(&self) -> Result<Vec<u8>, CoreError> {
        let payload = serde_json::json!({
            "claims": Value::Object(self.claims.clone()),
            "expiry": self.expiry_date.map(canonical_time),
            "issuanceDate": canonical_time(self.issued_date),
            "issuer": self.issuer.as_str(),
            "subject": self.subject.as_str(),
            "type": self.credential_type,
        });
        to_canonical_vec(&payload)
    }

    /// Key for status tracking, bound to the signed content.
    ///
    /// BLAKE3 over the id, the canonical payload and the signature, each
    /// length-prefixed. Any change to a signed field or to the signature
    /// yields a different fingerprint, so a modified copy never shares the
    /// original's verdict.
    pub fn fingerprint(&self) -> Result<String, CoreError> {
        let payload = self.signing_payload()?;
        let parts = [
            self.id.as_bytes(),
            payload.as_slice(),
            self.signature.as_bytes(),
        ];
        let mut bytes = Vec::with_capacity(parts.iter().map(|p| p.len() + 8).sum());
        for part in parts {
            bytes.extend_from_slice(&(part.len() as u64).to_be_bytes());
            bytes.extend_from_slice(part);
        }
        Ok(credo_crypto::content_hash_hex(&bytes))
    }

    /// Decode the detached signature.
    pub fn decode_signature(&self) -> Result<Signature, CryptoError> {
        Signature::from_base64url(&self.signature)
    }

    /// Whether `now` is at or past the expiry timestamp.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.map(|exp| now >= exp).unwrap_or(false)
    }
}

/// RFC 3339 UTC timestamp with millisecond precision (`...T12:00:00.000Z`).
pub fn canonical_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}
