/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("chain-account DID requires a chain address")]
    MissingChainAddress,

    #[error("invalid chain address: {0}")]
    InvalidChainAddress(String),

    #[error("DID method cannot be derived locally: {0}")]
    UnsupportedMethod(String),

    #[error("DID not found: {0}")]
    DidNotFound(String),

    #[error("DID resolution failed: {0}")]
    DidResolution(String),

    #[error("invalid identity document: {0}")]
    InvalidDocument(String),

    #[error("verification method not found: {0}")]
    MethodNotFound(String),

    #[error("core error: {0}")]
    Core(#[from] credo_core::CoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] credo_crypto::CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
