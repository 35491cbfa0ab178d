use credo_core::Did;

/// Credential system errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential not found: {0}")]
    CredentialNotFound(String),

    #[error("credential subject {subject} does not match wallet owner {owner}")]
    SubjectMismatch { subject: Did, owner: Did },

    #[error("issuance failed: {0}")]
    IssuanceFailed(String),

    #[error("invalid credential export: {0}")]
    InvalidExport(String),

    #[error("core error: {0}")]
    Core(#[from] credo_core::CoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] credo_crypto::CryptoError),

    #[error("identity error: {0}")]
    Identity(#[from] credo_identity::IdentityError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
