/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("entropy unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("signing failed: {0}")]
    SigningError(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),
}
