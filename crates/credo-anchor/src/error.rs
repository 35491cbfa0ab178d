/// Content store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("content not found: {0}")]
    NotFound(String),

    #[error("content store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid content address: {0}")]
    InvalidAddress(String),

    #[error("local cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Registry anchoring errors.
#[derive(Debug, thiserror::Error)]
pub enum AnchorError {
    #[error("registry unavailable: {0}")]
    AnchorUnavailable(String),

    #[error("stale update: expected {expected}, registry holds {actual}")]
    StaleUpdate { expected: String, actual: String },

    #[error("no registry record for owner {0}")]
    NotFound(String),

    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),
}
