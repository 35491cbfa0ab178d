//! Credo Agent
//!
//! Ties the identity, anchoring and credential layers together: staged
//! identity creation with resumable drafts, key rotation, republication of
//! degraded identities, and issuer resolution through the registry.
//! Configuration and tracing setup live here too.

pub mod config;
pub mod error;
pub mod identity;
pub mod resolver;
pub mod service;
pub mod telemetry;

pub use config::{AgentConfig, LogFormat, LoggingConfig};
pub use error::{AgentError, CreationFailed, Stage};
pub use identity::{Identity, IdentityDraft};
pub use resolver::AnchoredDidResolver;
pub use service::IdentityService;
pub use telemetry::init_tracing;
