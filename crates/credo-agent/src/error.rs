use crate::identity::IdentityDraft;

/// Identity creation stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Key pair, DID and document.
    KeyGeneration,
    /// Document upload to the content store.
    Publication,
    /// Registry binding of owner to `(DID, address)`.
    Anchoring,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyGeneration => write!(f, "key generation"),
            Self::Publication => write!(f, "publication"),
            Self::Anchoring => write!(f, "anchoring"),
        }
    }
}

/// Agent-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("key generation failed: {0}")]
    KeyGeneration(#[source] credo_crypto::CryptoError),

    #[error("crypto error: {0}")]
    Crypto(#[from] credo_crypto::CryptoError),

    #[error("identity error: {0}")]
    Identity(#[from] credo_identity::IdentityError),

    #[error("publication failed: {0}")]
    Publication(#[from] credo_anchor::StoreError),

    #[error("anchoring failed: {0}")]
    Anchoring(#[from] credo_anchor::AnchorError),

    #[error("credential error: {0}")]
    Credential(#[from] credo_credentials::CredentialError),

    #[error("{0} stage has not completed")]
    StageIncomplete(Stage),
}

/// Identity creation stopped at `stage`.
///
/// `draft` holds everything completed so far, so the caller can retry from
/// the failed stage. It is `None` only when key generation itself failed.
#[derive(Debug, thiserror::Error)]
#[error("identity creation failed at {stage}: {source}")]
pub struct CreationFailed {
    pub stage: Stage,
    pub draft: Option<Box<IdentityDraft>>,
    #[source]
    pub source: AgentError,
}
