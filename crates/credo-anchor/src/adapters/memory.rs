use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::error::{AnchorError, StoreError};
use crate::traits::{ContentStore, Ledger};
use crate::types::{AnchoredEntry, ContentAddress, LedgerEntry, Receipt, TxRef, TxStatus};

/// In-memory content store.
///
/// Addresses are derived from a BLAKE3 digest of the bytes, so the store is
/// idempotent like a real content-addressed network. Can be switched offline
/// to exercise fallback paths.
#[derive(Default)]
pub struct MemoryContentStore {
    blobs: DashMap<String, Bytes>,
    offline: AtomicBool,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `Unavailable` (or restore service).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, bytes: &[u8]) -> Result<ContentAddress, StoreError> {
        self.check_online()?;
        let cid = format!("bafy{}", credo_crypto::content_hash_hex(bytes));
        self.blobs
            .entry(cid.clone())
            .or_insert_with(|| Bytes::copy_from_slice(bytes));
        Ok(ContentAddress::Remote(cid))
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes, StoreError> {
        self.check_online()?;
        match address {
            ContentAddress::Remote(cid) => self
                .blobs
                .get(cid)
                .map(|b| b.value().clone())
                .ok_or_else(|| StoreError::NotFound(address.to_string())),
            ContentAddress::Local(_) => Err(StoreError::NotFound(address.to_string())),
        }
    }
}

/// When submitted entries become final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationMode {
    /// Entries are confirmed on submission.
    #[default]
    Immediate,
    /// Entries stay pending until [`MemoryLedger::confirm_all`] is called.
    Manual,
}

/// In-memory append-only ledger.
pub struct MemoryLedger {
    log: Mutex<Vec<AnchoredEntry>>,
    mode: ConfirmationMode,
    offline: AtomicBool,
}

impl MemoryLedger {
    pub fn new(mode: ConfirmationMode) -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            mode,
            offline: AtomicBool::new(false),
        }
    }

    /// Make every call fail with `AnchorUnavailable` (or restore service).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Confirm every pending entry. Returns how many were confirmed.
    pub async fn confirm_all(&self) -> usize {
        let mut log = self.log.lock().await;
        let mut confirmed = 0;
        for anchored in log.iter_mut() {
            if anchored.receipt.status == TxStatus::Pending {
                anchored.receipt.status = TxStatus::Confirmed;
                confirmed += 1;
            }
        }
        confirmed
    }

    /// Forget every pending entry, as a node does when it evicts
    /// transactions that never made it into a block. Returns how many were
    /// dropped.
    pub async fn drop_pending(&self) -> usize {
        let mut log = self.log.lock().await;
        let before = log.len();
        log.retain(|a| a.receipt.status != TxStatus::Pending);
        before - log.len()
    }

    /// Every entry ever submitted, in submission order.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.log.lock().await.iter().map(|a| a.entry.clone()).collect()
    }

    fn check_online(&self) -> Result<(), AnchorError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AnchorError::AnchorUnavailable("memory ledger is offline".into()));
        }
        Ok(())
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(ConfirmationMode::Immediate)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn submit(&self, entry: LedgerEntry) -> Result<Receipt, AnchorError> {
        self.check_online()?;
        let status = match self.mode {
            ConfirmationMode::Immediate => TxStatus::Confirmed,
            ConfirmationMode::Manual => TxStatus::Pending,
        };
        let receipt = Receipt {
            tx_ref: TxRef::new(),
            status,
            submitted_at: Utc::now(),
        };
        self.log.lock().await.push(AnchoredEntry {
            entry,
            receipt: receipt.clone(),
        });
        Ok(receipt)
    }

    async fn latest(&self, owner: &str) -> Result<Option<AnchoredEntry>, AnchorError> {
        self.check_online()?;
        let log = self.log.lock().await;
        Ok(log
            .iter()
            .rev()
            .find(|a| a.entry.owner == owner && a.receipt.status == TxStatus::Confirmed)
            .cloned())
    }

    async fn status(&self, tx_ref: &TxRef) -> Result<TxStatus, AnchorError> {
        self.check_online()?;
        let log = self.log.lock().await;
        log.iter()
            .find(|a| a.receipt.tx_ref == *tx_ref)
            .map(|a| a.receipt.status)
            .ok_or_else(|| AnchorError::UnknownTransaction(tx_ref.to_string()))
    }
}
