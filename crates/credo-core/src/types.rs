use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// DID methods understood by Credo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DidMethod {
    /// Key-derived identifiers (`did:key`), a function of the public key only.
    Key,
    /// Chain-account identifiers (`did:ethr`), a function of an account address.
    Ethr,
    /// Web-hosted identifiers (`did:web`). Parsed, never derived.
    Web,
}

impl DidMethod {
    /// The method name as it appears in the DID string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Ethr => "ethr",
            Self::Web => "web",
        }
    }
}

impl fmt::Display for DidMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DidMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept both "key" and the prefixed "did:key" form.
        match s.strip_prefix("did:").unwrap_or(s) {
            "key" => Ok(Self::Key),
            "ethr" => Ok(Self::Ethr),
            "web" => Ok(Self::Web),
            other => Err(CoreError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Decentralized Identifier.
/// Format: `did:<method>:<method-specific-id>`
///
/// A `Did` is immutable once constructed; key rotation adds verification
/// methods to the document instead of changing the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

impl Did {
    /// Parse and validate a full DID URI.
    pub fn parse(uri: &str) -> Result<Self, CoreError> {
        let mut parts = uri.splitn(3, ':');
        let scheme = parts.next().unwrap_or_default();
        let method = parts.next().unwrap_or_default();
        let id = parts.next().unwrap_or_default();

        if scheme != "did" {
            return Err(CoreError::InvalidDid(format!(
                "DID must start with 'did:', got: {}",
                uri
            )));
        }
        let valid_method = method
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if method.is_empty() || !valid_method {
            return Err(CoreError::InvalidDid(format!(
                "DID method must be lowercase alphanumeric, got: {}",
                uri
            )));
        }
        if id.is_empty() {
            return Err(CoreError::InvalidDid(format!(
                "DID must have format 'did:<method>:<id>', got: {}",
                uri
            )));
        }
        Ok(Self(uri.to_string()))
    }

    /// Build a DID from a known method and method-specific identifier.
    pub fn from_parts(method: DidMethod, identifier: &str) -> Self {
        Self(format!("did:{}:{}", method.as_str(), identifier))
    }

    /// The full DID URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The raw method name (e.g. `key`).
    pub fn method_name(&self) -> &str {
        self.0.split(':').nth(1).unwrap_or_default()
    }

    /// The method, if it is one Credo understands.
    pub fn method(&self) -> Option<DidMethod> {
        self.method_name().parse().ok()
    }

    /// Everything after `did:<method>:`.
    pub fn method_specific_id(&self) -> &str {
        self.0.splitn(3, ':').nth(2).unwrap_or_default()
    }

    /// A DID URL pointing at a fragment of this DID's document.
    pub fn with_fragment(&self, fragment: &str) -> String {
        format!("{}#{}", self.0, fragment)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Observable status of a verifiable credential.
///
/// Always a projection of signature, issuer and expiry checks; never stored
/// as ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    /// Not yet verified, or the last verification attempt failed.
    Pending,
    /// The last verification succeeded and the credential has not expired.
    Verified,
    /// The expiry timestamp has passed. Final state.
    Expired,
}

impl CredentialStatus {
    /// Whether this is a final (terminal) status.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

impl fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Verified => write!(f, "verified"),
            Self::Expired => write!(f, "expired"),
        }
    }
}
