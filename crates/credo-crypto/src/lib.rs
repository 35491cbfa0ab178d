pub mod error;
pub mod hashing;
pub mod jwk;
pub mod keys;
pub mod signing;

pub use error::CryptoError;
pub use hashing::{content_hash, content_hash_hex, Hash};
pub use jwk::{PrivateJwk, PublicJwk};
pub use keys::{KeyPair, PublicKey};
pub use signing::{sign, verify, verify_bytes, Signature};
