use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use p256::ecdsa::signature::{Signer, Verifier};

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

/// Length of a fixed-width `r || s` ECDSA P-256 signature.
pub const SIGNATURE_LEN: usize = 64;

/// ECDSA P-256 signature over SHA-256 (64 bytes, `r || s`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    inner: p256::ecdsa::Signature,
}

impl Signature {
    /// Get the raw bytes (64 bytes).
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out.copy_from_slice(&self.inner.to_bytes());
        out
    }

    /// Create from raw `r || s` bytes (64 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignature(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LEN,
                bytes.len()
            )));
        }
        let inner = p256::ecdsa::Signature::from_slice(bytes)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Encode as unpadded base64url.
    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_bytes())
    }

    /// Decode from unpadded base64url.
    pub fn from_base64url(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidSignature(format!("invalid base64url: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

/// Sign a message with ECDSA P-256 over SHA-256(message).
///
/// Nonces are derived deterministically (RFC 6979), so the same key and
/// message always yield the same signature.
pub fn sign(message: &[u8], keypair: &KeyPair) -> Result<Signature, CryptoError> {
    let inner: p256::ecdsa::Signature = keypair
        .signing_key()
        .try_sign(message)
        .map_err(|e| CryptoError::SigningError(e.to_string()))?;
    Ok(Signature { inner })
}

/// Verify an ECDSA P-256 signature.
pub fn verify(message: &[u8], signature: &Signature, pubkey: &PublicKey) -> bool {
    pubkey
        .verifying_key()
        .verify(message, &signature.inner)
        .is_ok()
}

/// Verify a signature supplied as raw bytes.
///
/// Malformed signatures (wrong length, zero or out-of-range scalars) are
/// reported as `false`, never as an error.
pub fn verify_bytes(message: &[u8], signature: &[u8], pubkey: &PublicKey) -> bool {
    match Signature::from_bytes(signature) {
        Ok(sig) => verify(message, &sig, pubkey),
        Err(_) => false,
    }
}
