use credo_core::{Did, DidMethod};
use credo_crypto::PublicKey;

use crate::error::IdentityError;

/// Number of characters of the concatenated JWK coordinates kept in a
/// `did:key` identifier.
pub const KEY_ID_LEN: usize = 32;

/// Derives DIDs from verification material.
///
/// Derivation is a pure function of its inputs: no randomness, no storage,
/// no network.
pub struct DidDeriver;

impl DidDeriver {
    /// Derive a DID for `public_key` under `method`.
    ///
    /// - `did:key`: `did:key:z` followed by the first 32 characters of the
    ///   base64url `x` and `y` coordinates concatenated.
    /// - `did:ethr`: `did:ethr:<chain_address>`, lowercased.
    pub fn derive(
        public_key: &PublicKey,
        method: DidMethod,
        chain_address: Option<&str>,
    ) -> Result<Did, IdentityError> {
        let did = match method {
            DidMethod::Key => Self::key_did(public_key),
            DidMethod::Ethr => {
                let address = chain_address.ok_or(IdentityError::MissingChainAddress)?;
                Self::ethr_did(address)?
            }
            DidMethod::Web => {
                return Err(IdentityError::UnsupportedMethod(method.to_string()));
            }
        };

        tracing::debug!(did = %did, method = %method, "DID derived");
        Ok(did)
    }

    /// `did:key` identifier for a public key.
    pub fn key_did(public_key: &PublicKey) -> Did {
        let jwk = public_key.to_jwk();
        let joined = format!("{}{}", jwk.x, jwk.y);
        // base64url output is ASCII, so byte slicing is char slicing.
        let prefix = &joined[..KEY_ID_LEN.min(joined.len())];
        Did::from_parts(DidMethod::Key, &format!("z{}", prefix))
    }

    /// `did:ethr` identifier for a `0x`-prefixed 20-byte account address.
    pub fn ethr_did(address: &str) -> Result<Did, IdentityError> {
        let normalized = normalize_chain_address(address)?;
        Ok(Did::from_parts(DidMethod::Ethr, &normalized))
    }
}

/// Validate a `0x` + 40 hex character account address and lowercase it.
pub fn normalize_chain_address(address: &str) -> Result<String, IdentityError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| IdentityError::InvalidChainAddress(address.to_string()))?;
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(IdentityError::InvalidChainAddress(address.to_string()));
    }
    Ok(format!("0x{}", hex_part.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use credo_crypto::KeyPair;

    const ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    #[test]
    fn test_key_did_format() {
        let kp = KeyPair::generate().unwrap();
        let did = DidDeriver::derive(&kp.public_key(), DidMethod::Key, None).unwrap();

        assert!(did.as_str().starts_with("did:key:z"));
        assert_eq!(did.method_specific_id().len(), KEY_ID_LEN + 1);
        assert_eq!(did.method(), Some(DidMethod::Key));
    }

    #[test]
    fn test_key_did_matches_coordinates() {
        let kp = KeyPair::generate().unwrap();
        let jwk = kp.public_key().to_jwk();
        let did = DidDeriver::key_did(&kp.public_key());
        let expected = format!("did:key:z{}", &jwk.x[..KEY_ID_LEN]);
        // x alone is 43 characters, so the prefix never reaches y.
        assert_eq!(did.as_str(), expected);
    }

    #[test]
    fn test_key_did_deterministic() {
        let kp = KeyPair::from_secret_bytes(&[7u8; 32]).unwrap();
        let d1 = DidDeriver::derive(&kp.public_key(), DidMethod::Key, None).unwrap();
        let d2 = DidDeriver::derive(&kp.public_key(), DidMethod::Key, None).unwrap();
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_key_did_differs_per_key() {
        let kp1 = KeyPair::generate().unwrap();
        let kp2 = KeyPair::generate().unwrap();
        assert_ne!(
            DidDeriver::key_did(&kp1.public_key()),
            DidDeriver::key_did(&kp2.public_key())
        );
    }

    #[test]
    fn test_key_did_ignores_chain_address() {
        let kp = KeyPair::generate().unwrap();
        let with = DidDeriver::derive(&kp.public_key(), DidMethod::Key, Some(ADDRESS)).unwrap();
        let without = DidDeriver::derive(&kp.public_key(), DidMethod::Key, None).unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_ethr_did() {
        let kp = KeyPair::generate().unwrap();
        let did = DidDeriver::derive(&kp.public_key(), DidMethod::Ethr, Some(ADDRESS)).unwrap();
        assert_eq!(
            did.as_str(),
            "did:ethr:0x52908400098527886e0f7030069857d2e4169ee7"
        );
    }

    #[test]
    fn test_ethr_requires_address() {
        let kp = KeyPair::generate().unwrap();
        let result = DidDeriver::derive(&kp.public_key(), DidMethod::Ethr, None);
        assert!(matches!(result, Err(IdentityError::MissingChainAddress)));
    }

    #[test]
    fn test_ethr_rejects_malformed_address() {
        for bad in [
            "52908400098527886E0F7030069857D2E4169EE7",
            "0x1234",
            "0xZZ908400098527886E0F7030069857D2E4169EE7",
        ] {
            assert!(matches!(
                DidDeriver::ethr_did(bad),
                Err(IdentityError::InvalidChainAddress(_))
            ));
        }
    }

    #[test]
    fn test_web_cannot_be_derived() {
        let kp = KeyPair::generate().unwrap();
        let result = DidDeriver::derive(&kp.public_key(), DidMethod::Web, None);
        assert!(matches!(result, Err(IdentityError::UnsupportedMethod(_))));
    }
}
