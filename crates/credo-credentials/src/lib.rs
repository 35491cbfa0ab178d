//! Credo Credentials: issuance, status tracking, verification and the
//! holder wallet.
//!
//! Credential status is never stored on the credential itself. It is
//! computed from the expiry timestamp and the last verification verdict.

pub mod credential;
pub mod error;
pub mod export;
pub mod holder;
pub mod issuer;
pub mod status;
pub mod verifier;

pub use credential::{canonical_time, Claims, VerifiableCredential};
pub use error::CredentialError;
pub use export::CredentialExport;
pub use holder::CredentialWallet;
pub use issuer::CredentialIssuer;
pub use status::{current_status, StatusTracker};
pub use verifier::{NoRevocation, RevocationCheck, VerificationEngine, VerificationOutcome};
