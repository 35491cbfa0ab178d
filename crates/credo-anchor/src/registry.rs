use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;

use credo_core::Did;

use crate::error::AnchorError;
use crate::traits::Ledger;
use crate::types::{AnchoredEntry, ContentAddress, LedgerEntry, Receipt, RegistryRecord, TxStatus};

/// Default bound on a single ledger call.
pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(30);

/// Binds owners to `(DID, content address)` records on a ledger.
///
/// Writes for one owner are serialised through a per-owner lock. The anchor
/// remembers its own latest write per owner so that a lookup issued right
/// after a write sees it even while the ledger has not confirmed it yet.
pub struct RegistryAnchor<L> {
    ledger: L,
    timeout: Duration,
    locks: DashMap<String, Arc<Mutex<()>>>,
    view: DashMap<String, AnchoredEntry>,
}

impl<L: Ledger> RegistryAnchor<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            ledger,
            timeout: DEFAULT_LEDGER_TIMEOUT,
            locks: DashMap::new(),
            view: DashMap::new(),
        }
    }

    /// Bound every ledger call by `timeout`; expiry surfaces as `AnchorUnavailable`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Bind `owner` to `(did, content_address)`.
    ///
    /// Registering the record that is already current is a no-op success
    /// returning the existing receipt. If a different record is live, this
    /// behaves as [`RegistryAnchor::update`] against it.
    pub async fn register(
        &self,
        owner: &str,
        did: &Did,
        content_address: &ContentAddress,
    ) -> Result<Receipt, AnchorError> {
        let lock = self.lock_for(owner);
        let _guard = lock.lock().await;

        match self.current(owner).await? {
            Some(current) if current.entry.binds(did, content_address) => {
                tracing::debug!(owner = owner, did = %did, "record already anchored");
                Ok(current.receipt)
            }
            _ => self.write(LedgerEntry::register(owner, did, content_address)).await,
        }
    }

    /// Replace the owner's live record, provided it still points at
    /// `expected_previous`.
    ///
    /// Fails with `StaleUpdate` if the record has moved on and with
    /// `NotFound` if there is no live record. Repeating an update that
    /// already took effect is a no-op success.
    pub async fn update(
        &self,
        owner: &str,
        did: &Did,
        content_address: &ContentAddress,
        expected_previous: &ContentAddress,
    ) -> Result<Receipt, AnchorError> {
        let lock = self.lock_for(owner);
        let _guard = lock.lock().await;

        let current = self
            .current(owner)
            .await?
            .filter(|c| c.entry.record().is_some())
            .ok_or_else(|| AnchorError::NotFound(owner.to_string()))?;

        if current.entry.binds(did, content_address) {
            return Ok(current.receipt);
        }
        if current.entry.content_address != *expected_previous {
            return Err(AnchorError::StaleUpdate {
                expected: expected_previous.to_string(),
                actual: current.entry.content_address.to_string(),
            });
        }
        self.write(LedgerEntry::register(owner, did, content_address)).await
    }

    /// Current live record for `owner`.
    pub async fn lookup(&self, owner: &str) -> Result<RegistryRecord, AnchorError> {
        self.current(owner)
            .await?
            .and_then(|c| c.entry.record())
            .ok_or_else(|| AnchorError::NotFound(owner.to_string()))
    }

    /// Append a revocation marker for the owner's live record.
    ///
    /// A later `register` starts a fresh record.
    pub async fn revoke(&self, owner: &str) -> Result<Receipt, AnchorError> {
        let lock = self.lock_for(owner);
        let _guard = lock.lock().await;

        let current = self
            .current(owner)
            .await?
            .filter(|c| c.entry.record().is_some())
            .ok_or_else(|| AnchorError::NotFound(owner.to_string()))?;
        let entry = LedgerEntry::revoke(owner, &current.entry.did, &current.entry.content_address);
        self.write(entry).await
    }

    /// Re-read the finality of the owner's latest write.
    pub async fn refresh_receipt(&self, owner: &str) -> Result<Receipt, AnchorError> {
        let local = self.view.get(owner).map(|v| v.value().clone());
        match local {
            Some(anchored) => {
                let status = self.guarded(self.ledger.status(&anchored.receipt.tx_ref)).await?;
                Ok(self.record_status(owner, &anchored, status))
            }
            None => self
                .guarded(self.ledger.latest(owner))
                .await?
                .map(|a| a.receipt)
                .ok_or_else(|| AnchorError::NotFound(owner.to_string())),
        }
    }

    /// The owner's current entry: our own write while it is still pending,
    /// otherwise the ledger's latest confirmed entry.
    ///
    /// A pending write the ledger no longer knows about was dropped before
    /// inclusion; it is evicted from the view and the ledger's state wins.
    async fn current(&self, owner: &str) -> Result<Option<AnchoredEntry>, AnchorError> {
        let pending = self
            .view
            .get(owner)
            .filter(|v| v.receipt.status == TxStatus::Pending)
            .map(|v| v.value().clone());

        if let Some(local) = pending {
            match self.guarded(self.ledger.status(&local.receipt.tx_ref)).await {
                Ok(TxStatus::Pending) => return Ok(Some(local)),
                Ok(status) => {
                    self.record_status(owner, &local, status);
                }
                Err(AnchorError::UnknownTransaction(tx_ref)) => {
                    tracing::warn!(
                        owner = owner,
                        tx_ref = %tx_ref,
                        "pending registry write dropped by ledger"
                    );
                    self.view
                        .remove_if(owner, |_, v| v.receipt.tx_ref == local.receipt.tx_ref);
                }
                Err(e) => return Err(e),
            }
        }

        self.guarded(self.ledger.latest(owner)).await
    }

    async fn write(&self, entry: LedgerEntry) -> Result<Receipt, AnchorError> {
        let owner = entry.owner.clone();
        let receipt = self.guarded(self.ledger.submit(entry.clone())).await?;

        tracing::info!(
            owner = %owner,
            did = %entry.did,
            address = %entry.content_address,
            kind = ?entry.kind,
            tx_ref = %receipt.tx_ref,
            status = %receipt.status,
            "registry entry submitted"
        );
        self.view.insert(
            owner,
            AnchoredEntry {
                entry,
                receipt: receipt.clone(),
            },
        );
        Ok(receipt)
    }

    fn record_status(&self, owner: &str, anchored: &AnchoredEntry, status: TxStatus) -> Receipt {
        let receipt = Receipt {
            status,
            ..anchored.receipt.clone()
        };
        if let Some(mut slot) = self.view.get_mut(owner) {
            if slot.receipt.tx_ref == receipt.tx_ref {
                slot.receipt.status = status;
            }
        }
        receipt
    }

    fn lock_for(&self, owner: &str) -> Arc<Mutex<()>> {
        self.locks.entry(owner.to_string()).or_default().clone()
    }

    async fn guarded<T>(
        &self,
        call: impl Future<Output = Result<T, AnchorError>>,
    ) -> Result<T, AnchorError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| AnchorError::AnchorUnavailable("ledger call timed out".into()))?
    }
}
