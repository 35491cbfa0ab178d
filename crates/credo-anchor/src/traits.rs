use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{AnchorError, StoreError};
use crate::types::{AnchoredEntry, ContentAddress, LedgerEntry, Receipt, TxRef, TxStatus};

/// Content-addressed blob store.
///
/// Implementations must be idempotent: putting the same bytes twice yields
/// the same address.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a blob and return its address.
    async fn put(&self, bytes: &[u8]) -> Result<ContentAddress, StoreError>;

    /// Fetch a blob by address. Fails with `NotFound` if unresolvable.
    async fn get(&self, address: &ContentAddress) -> Result<Bytes, StoreError>;
}

/// Append-only registry ledger binding owners to DID records.
///
/// The ledger may delay finality: a submitted entry is `Pending` until the
/// ledger confirms it, and `latest` only reflects confirmed entries.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append an entry.
    async fn submit(&self, entry: LedgerEntry) -> Result<Receipt, AnchorError>;

    /// Latest confirmed entry for an owner.
    async fn latest(&self, owner: &str) -> Result<Option<AnchoredEntry>, AnchorError>;

    /// Current finality of a submitted transaction.
    async fn status(&self, tx_ref: &TxRef) -> Result<TxStatus, AnchorError>;
}

/// Serialize `value` as pretty JSON and store it.
pub async fn put_json<S, T>(store: &S, value: &T) -> Result<ContentAddress, StoreError>
where
    S: ContentStore + ?Sized,
    T: Serialize + Sync,
{
    let bytes = serde_json::to_vec_pretty(value)?;
    store.put(&bytes).await
}

/// Fetch a blob and decode it as JSON.
pub async fn get_json<S, T>(store: &S, address: &ContentAddress) -> Result<T, StoreError>
where
    S: ContentStore + ?Sized,
    T: DeserializeOwned,
{
    let bytes = store.get(address).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
