use crate::types::CredentialStatus;

/// Core protocol errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid status transition from {from} on {event}")]
    InvalidStatusTransition {
        from: CredentialStatus,
        event: &'static str,
    },

    #[error("invalid DID format: {0}")]
    InvalidDid(String),

    #[error("unsupported DID method: {0}")]
    UnsupportedMethod(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
