//! Credo Anchoring Layer
//!
//! Publishes identity documents to a content-addressed store and binds
//! owners to `(DID, content address)` pairs on an append-only registry:
//! - Content store boundary with an IPFS HTTP adapter
//! - Local blob cache and degraded-mode fallback publication
//! - Registry anchor with idempotent registration and optimistic concurrency
//! - In-memory adapters for both boundaries

pub mod adapters;
pub mod cache;
pub mod error;
pub mod fallback;
pub mod registry;
pub mod traits;
pub mod types;

pub use adapters::ipfs::IpfsContentStore;
pub use adapters::memory::{ConfirmationMode, MemoryContentStore, MemoryLedger};
pub use cache::LocalCache;
pub use error::{AnchorError, StoreError};
pub use fallback::{FallbackContentStore, Published};
pub use registry::RegistryAnchor;
pub use traits::{get_json, put_json, ContentStore, Ledger};
pub use types::{
    AnchoredEntry, ContentAddress, EntryKind, LedgerEntry, Receipt, RegistryRecord, TxRef,
    TxStatus, LOCAL_PREFIX,
};
