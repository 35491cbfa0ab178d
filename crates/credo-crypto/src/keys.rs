use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::{EncodedPoint, FieldBytes};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::jwk::{encode_field, PrivateJwk, PublicJwk, FIELD_LEN};

/// Candidate scalars outside the curve order are redrawn; the chance of
/// needing even a second draw is about 2^-32.
const MAX_SCALAR_DRAWS: usize = 8;

/// P-256 key pair for ECDSA signing.
/// Private key material is zeroized on drop by the underlying `SigningKey`.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Result<Self, CryptoError> {
        Self::generate_with(&mut OsRng)
    }

    /// Generate a key pair from the supplied random source.
    pub fn generate_with<R: RngCore>(rng: &mut R) -> Result<Self, CryptoError> {
        let mut seed = [0u8; FIELD_LEN];
        for _ in 0..MAX_SCALAR_DRAWS {
            rng.try_fill_bytes(&mut seed)
                .map_err(|e| CryptoError::EntropyUnavailable(e.to_string()))?;
            let candidate = SigningKey::from_slice(&seed);
            seed.zeroize();
            if let Ok(signing_key) = candidate {
                return Ok(Self { signing_key });
            }
        }
        Err(CryptoError::EntropyUnavailable(
            "random source produced no valid scalar".into(),
        ))
    }

    /// Create a key pair from a raw 32-byte big-endian private scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != FIELD_LEN {
            return Err(CryptoError::InvalidKeyFormat(format!(
                "private scalar must be {} bytes, got {}",
                FIELD_LEN,
                bytes.len()
            )));
        }
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|_| CryptoError::InvalidKeyFormat("private scalar out of range".into()))?;
        Ok(Self { signing_key })
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: VerifyingKey::from(&self.signing_key),
        }
    }

    /// Export the full key pair as a private JWK record.
    ///
    /// This is the only way private key bytes leave the key pair.
    pub fn export_private(&self) -> PrivateJwk {
        let public = self.public_key().to_jwk();
        let mut d = [0u8; FIELD_LEN];
        d.copy_from_slice(&self.signing_key.to_bytes());
        let record = PrivateJwk {
            kty: public.kty.clone(),
            curve: public.curve.clone(),
            x: public.x.clone(),
            y: public.y.clone(),
            d: encode_field(&d),
        };
        d.zeroize();
        record
    }

    /// Import a key pair from a private JWK record.
    ///
    /// The record's public coordinates must match its private scalar.
    pub fn import_private(record: &PrivateJwk) -> Result<Self, CryptoError> {
        let mut scalar = record.scalar()?;
        let result = Self::from_secret_bytes(&scalar);
        scalar.zeroize();
        let keypair = result?;

        let claimed = PublicKey::from_jwk(&record.public())?;
        if claimed != keypair.public_key() {
            return Err(CryptoError::InvalidKeyFormat(
                "public coordinates do not match private scalar".into(),
            ));
        }
        Ok(keypair)
    }

    /// Access the underlying ECDSA signing key.
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// P-256 public key for signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Create from raw affine coordinates. Fails if the point is not on the curve.
    pub fn from_coordinates(x: &[u8; FIELD_LEN], y: &[u8; FIELD_LEN]) -> Result<Self, CryptoError> {
        let point = EncodedPoint::from_affine_coordinates(
            FieldBytes::from_slice(x),
            FieldBytes::from_slice(y),
            false,
        );
        let verifying_key = VerifyingKey::from_encoded_point(&point)
            .map_err(|_| CryptoError::InvalidKeyFormat("point is not on P-256".into()))?;
        Ok(Self { verifying_key })
    }

    /// Raw affine coordinates `(x, y)`, each 32 bytes big-endian.
    pub fn coordinates(&self) -> ([u8; FIELD_LEN], [u8; FIELD_LEN]) {
        let point = self.verifying_key.to_encoded_point(false);
        let mut x = [0u8; FIELD_LEN];
        let mut y = [0u8; FIELD_LEN];
        // Uncompressed encodings of a valid key always carry both coordinates.
        if let (Some(px), Some(py)) = (point.x(), point.y()) {
            x.copy_from_slice(px);
            y.copy_from_slice(py);
        }
        (x, y)
    }

    /// Export as a public JWK record.
    pub fn to_jwk(&self) -> PublicJwk {
        let (x, y) = self.coordinates();
        PublicJwk::from_coordinates(&x, &y)
    }

    /// Import from a public JWK record.
    pub fn from_jwk(record: &PublicJwk) -> Result<Self, CryptoError> {
        let (x, y) = record.coordinates()?;
        Self::from_coordinates(&x, &y)
    }

    /// SEC1 uncompressed encoding (65 bytes), hex encoded.
    pub fn to_hex(&self) -> String {
        hex::encode(self.verifying_key.to_encoded_point(false).as_bytes())
    }

    /// Access the underlying verifying key.
    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "rng offline",
            )))
        }
    }

    #[test]
    fn test_generate_keypair() {
        let kp = KeyPair::generate().unwrap();
        let (x, y) = kp.public_key().coordinates();
        assert_ne!(x, [0u8; 32]);
        assert_ne!(y, [0u8; 32]);
    }

    #[test]
    fn test_generate_distinct() {
        let kp1 = KeyPair::generate().unwrap();
        let kp2 = KeyPair::generate().unwrap();
        assert_ne!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_entropy_unavailable() {
        let result = KeyPair::generate_with(&mut BrokenRng);
        assert!(matches!(result, Err(CryptoError::EntropyUnavailable(_))));
    }

    #[test]
    fn test_from_secret_bytes_deterministic() {
        let kp1 = KeyPair::from_secret_bytes(&[42u8; 32]).unwrap();
        let kp2 = KeyPair::from_secret_bytes(&[42u8; 32]).unwrap();
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_from_secret_bytes_invalid() {
        assert!(KeyPair::from_secret_bytes(&[1u8; 16]).is_err());
        assert!(KeyPair::from_secret_bytes(&[0u8; 32]).is_err());
        assert!(KeyPair::from_secret_bytes(&[0xFFu8; 32]).is_err());
    }

    #[test]
    fn test_private_jwk_roundtrip() {
        let kp = KeyPair::generate().unwrap();
        let record = kp.export_private();
        assert_eq!(record.d.len(), 43);
        let back = KeyPair::import_private(&record).unwrap();
        assert_eq!(back.public_key(), kp.public_key());
    }

    #[test]
    fn test_private_jwk_json_roundtrip() {
        let kp = KeyPair::generate().unwrap();
        let json = serde_json::to_string(&kp.export_private()).unwrap();
        let record: PrivateJwk = serde_json::from_str(&json).unwrap();
        let back = KeyPair::import_private(&record).unwrap();
        assert_eq!(back.public_key(), kp.public_key());
    }

    #[test]
    fn test_private_jwk_mismatched_public_rejected() {
        let kp1 = KeyPair::generate().unwrap();
        let kp2 = KeyPair::generate().unwrap();
        let mut record = kp1.export_private();
        let other = kp2.public_key().to_jwk();
        record.x = other.x;
        record.y = other.y;
        assert!(matches!(
            KeyPair::import_private(&record),
            Err(CryptoError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn test_public_jwk_roundtrip() {
        let kp = KeyPair::generate().unwrap();
        let jwk = kp.public_key().to_jwk();
        assert_eq!(jwk.kty, "EC");
        assert_eq!(jwk.curve, "P-256");
        let back = PublicKey::from_jwk(&jwk).unwrap();
        assert_eq!(back, kp.public_key());
    }

    #[test]
    fn test_point_not_on_curve_rejected() {
        let result = PublicKey::from_coordinates(&[1u8; 32], &[2u8; 32]);
        assert!(matches!(result, Err(CryptoError::InvalidKeyFormat(_))));
    }

    #[test]
    fn test_public_key_hex_is_uncompressed_sec1() {
        let kp = KeyPair::generate().unwrap();
        let hex_str = kp.public_key().to_hex();
        assert_eq!(hex_str.len(), 130);
        assert!(hex_str.starts_with("04"));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let kp = KeyPair::from_secret_bytes(&[42u8; 32]).unwrap();
        let dbg = format!("{:?}", kp);
        assert!(dbg.starts_with("KeyPair"));
        assert!(!dbg.contains("signing_key"));
    }
}
