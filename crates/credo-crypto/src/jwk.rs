//! JSON Web Key interchange records for P-256 keys.
//!
//! Coordinates and the private scalar are 32-byte big-endian values encoded
//! as unpadded base64url, so every encoded field is exactly 43 characters.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// JWK key type for elliptic-curve keys.
pub const KTY_EC: &str = "EC";
/// JWK curve name for NIST P-256.
pub const CRV_P256: &str = "P-256";
/// Width of every encoded field element, in bytes.
pub const FIELD_LEN: usize = 32;

/// Public key interchange record: `{kty, crv, x, y}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicJwk {
    pub kty: String,
    #[serde(rename = "crv")]
    pub curve: String,
    pub x: String,
    pub y: String,
}

impl PublicJwk {
    /// Build a record from raw affine coordinates.
    pub fn from_coordinates(x: &[u8; FIELD_LEN], y: &[u8; FIELD_LEN]) -> Self {
        Self {
            kty: KTY_EC.to_string(),
            curve: CRV_P256.to_string(),
            x: encode_field(x),
            y: encode_field(y),
        }
    }

    /// Decode and length-check both coordinates.
    pub fn coordinates(&self) -> Result<([u8; FIELD_LEN], [u8; FIELD_LEN]), CryptoError> {
        check_header(&self.kty, &self.curve)?;
        Ok((decode_field("x", &self.x)?, decode_field("y", &self.y)?))
    }
}

/// Private key interchange record: `{kty, crv, x, y, d}`.
///
/// The private scalar is wiped from memory when the record is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateJwk {
    pub kty: String,
    #[serde(rename = "crv")]
    pub curve: String,
    pub x: String,
    pub y: String,
    pub d: String,
}

impl PrivateJwk {
    /// The public half of this record.
    pub fn public(&self) -> PublicJwk {
        PublicJwk {
            kty: self.kty.clone(),
            curve: self.curve.clone(),
            x: self.x.clone(),
            y: self.y.clone(),
        }
    }

    /// Decode and length-check the private scalar.
    pub fn scalar(&self) -> Result<[u8; FIELD_LEN], CryptoError> {
        check_header(&self.kty, &self.curve)?;
        decode_field("d", &self.d)
    }
}

impl std::fmt::Debug for PrivateJwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateJwk")
            .field("kty", &self.kty)
            .field("crv", &self.curve)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("d", &"<redacted>")
            .finish()
    }
}

impl Drop for PrivateJwk {
    fn drop(&mut self) {
        self.d.zeroize();
    }
}

fn check_header(kty: &str, curve: &str) -> Result<(), CryptoError> {
    if kty != KTY_EC {
        return Err(CryptoError::InvalidKeyFormat(format!(
            "expected kty {}, got {}",
            KTY_EC, kty
        )));
    }
    if curve != CRV_P256 {
        return Err(CryptoError::InvalidKeyFormat(format!(
            "expected crv {}, got {}",
            CRV_P256, curve
        )));
    }
    Ok(())
}

pub(crate) fn encode_field(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_field(name: &str, encoded: &str) -> Result<[u8; FIELD_LEN], CryptoError> {
    let mut bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| CryptoError::InvalidKeyFormat(format!("{} is not base64url: {}", name, e)))?;
    if bytes.len() != FIELD_LEN {
        let len = bytes.len();
        bytes.zeroize();
        return Err(CryptoError::InvalidKeyFormat(format!(
            "{} must be {} bytes, got {}",
            name, FIELD_LEN, len
        )));
    }
    let mut out = [0u8; FIELD_LEN];
    out.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(out)
}
