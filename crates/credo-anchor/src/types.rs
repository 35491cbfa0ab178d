use chrono::{DateTime, Utc};
use credo_core::Did;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Prefix distinguishing locally cached addresses from remote ones.
pub const LOCAL_PREFIX: &str = "local_";

/// Opaque identifier of a published blob.
///
/// `Remote` addresses come from the shared content store and are durable.
/// `Local` addresses name blobs held only in this client's fallback cache;
/// they render as `local_<digest>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContentAddress {
    Remote(String),
    Local(String),
}

impl ContentAddress {
    /// Parse the string form of an address.
    ///
    /// Only ASCII alphanumerics, `-` and `_` are accepted, so an address is
    /// always a safe single path component.
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        let (local, body) = match s.strip_prefix(LOCAL_PREFIX) {
            Some(digest) => (true, digest),
            None => (false, s),
        };
        if body.is_empty()
            || !body
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StoreError::InvalidAddress(s.to_string()));
        }
        Ok(if local {
            Self::Local(body.to_string())
        } else {
            Self::Remote(body.to_string())
        })
    }

    /// Whether the blob lives only in the local fallback cache.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl std::fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(cid) => write!(f, "{}", cid),
            Self::Local(digest) => write!(f, "{}{}", LOCAL_PREFIX, digest),
        }
    }
}

impl std::str::FromStr for ContentAddress {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentAddress {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentAddress> for String {
    fn from(address: ContentAddress) -> Self {
        address.to_string()
    }
}

/// Reference to a submitted ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxRef(pub String);

impl TxRef {
    /// Create a new time-ordered transaction reference.
    pub fn new() -> Self {
        Self(format!("tx_{}", Uuid::now_v7().simple()))
    }
}

impl Default for TxRef {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TxRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Finality of a ledger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TxStatus {
    /// Accepted by the ledger but not yet final.
    Pending,
    /// Final; visible to every reader of the ledger.
    Confirmed,
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
        }
    }
}

/// What a ledger entry does to the owner's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Binds the owner to a DID and content address.
    Register,
    /// Marks the owner's record as revoked.
    Revoke,
}

/// One append-only registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub owner: String,
    pub did: Did,
    pub content_address: ContentAddress,
    pub kind: EntryKind,
}

impl LedgerEntry {
    pub fn register(owner: &str, did: &Did, content_address: &ContentAddress) -> Self {
        Self {
            owner: owner.to_string(),
            did: did.clone(),
            content_address: content_address.clone(),
            kind: EntryKind::Register,
        }
    }

    pub fn revoke(owner: &str, did: &Did, content_address: &ContentAddress) -> Self {
        Self {
            kind: EntryKind::Revoke,
            ..Self::register(owner, did, content_address)
        }
    }

    /// Whether this entry binds `(did, content_address)` as a live record.
    pub fn binds(&self, did: &Did, content_address: &ContentAddress) -> bool {
        self.kind == EntryKind::Register
            && self.did == *did
            && self.content_address == *content_address
    }

    /// The live record this entry represents, if it is not a revocation.
    pub fn record(&self) -> Option<RegistryRecord> {
        match self.kind {
            EntryKind::Register => Some(RegistryRecord {
                did: self.did.clone(),
                content_address: self.content_address.clone(),
            }),
            EntryKind::Revoke => None,
        }
    }
}

/// Proof that a ledger write was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub tx_ref: TxRef,
    pub status: TxStatus,
    pub submitted_at: DateTime<Utc>,
}

/// A ledger entry together with the receipt of the write that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredEntry {
    pub entry: LedgerEntry,
    pub receipt: Receipt,
}

/// The record a lookup returns for an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRecord {
    pub did: Did,
    pub content_address: ContentAddress,
}
