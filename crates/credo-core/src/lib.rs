//! Credo Core: fundamental types, errors, and canonical serialization for
//! the Credo identity and credential trust core.

pub mod canonical;
pub mod credential_state;
pub mod error;
pub mod types;

pub use canonical::{to_canonical_string, to_canonical_vec};
pub use credential_state::{CredentialEvent, CredentialStateMachine};
pub use error::CoreError;
pub use types::{CredentialStatus, Did, DidMethod};
