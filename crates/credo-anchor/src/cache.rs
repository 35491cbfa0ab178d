use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::StoreError;
use crate::traits::ContentStore;
use crate::types::ContentAddress;

/// Directory-backed blob cache.
///
/// One file per address. Writes land in a temporary file that is renamed
/// into place, so a cancelled or failed write never leaves a partial blob
/// under a valid address.
#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    /// Open (creating if needed) a cache rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The local address for a blob: `local_<blake3 hex>`.
    pub fn address_for(bytes: &[u8]) -> ContentAddress {
        ContentAddress::Local(credo_crypto::content_hash_hex(bytes))
    }

    /// Write `bytes` under `address`, replacing any previous blob.
    pub async fn write(&self, address: &ContentAddress, bytes: &[u8]) -> Result<(), StoreError> {
        let target = self.path_for(address);
        let staging = self.root.join(format!(".tmp-{}", Uuid::now_v7().simple()));

        if let Err(e) = tokio::fs::write(&staging, bytes).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&staging, &target).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        tracing::debug!(address = %address, size = bytes.len(), "blob cached");
        Ok(())
    }

    /// Read the blob stored under `address`.
    pub async fn read(&self, address: &ContentAddress) -> Result<Bytes, StoreError> {
        match tokio::fs::read(self.path_for(address)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(address.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a blob is cached under `address`.
    pub async fn contains(&self, address: &ContentAddress) -> bool {
        tokio::fs::try_exists(self.path_for(address))
            .await
            .unwrap_or(false)
    }

    // Addresses only contain [A-Za-z0-9_-], so the rendered form is a safe file name.
    fn path_for(&self, address: &ContentAddress) -> PathBuf {
        self.root.join(address.to_string())
    }
}

#[async_trait]
impl ContentStore for LocalCache {
    async fn put(&self, bytes: &[u8]) -> Result<ContentAddress, StoreError> {
        let address = Self::address_for(bytes);
        if !self.contains(&address).await {
            self.write(&address, bytes).await?;
        }
        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes, StoreError> {
        self.read(address).await
    }
}
