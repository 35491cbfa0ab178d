//! Credo Identity Layer
//!
//! Provides decentralised identity primitives:
//! - Deterministic DID derivation (`did:key`, `did:ethr`)
//! - Identity documents (W3C DID Core shape, JWK verification methods)
//! - DID resolution (local, composite)

pub mod did;
pub mod did_resolver;
pub mod document;
pub mod error;

pub use did::DidDeriver;
pub use did_resolver::{CompositeDidResolver, DidResolver, LocalDidResolver};
pub use document::{
    DocumentBuilder, IdentityDocument, MethodPurpose, VerificationMethod, ALL_PURPOSES,
    JSON_WEB_KEY_2020,
};
pub use error::IdentityError;
