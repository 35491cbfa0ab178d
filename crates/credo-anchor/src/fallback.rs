use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::cache::LocalCache;
use crate::error::StoreError;
use crate::traits::ContentStore;
use crate::types::ContentAddress;

/// Result of a publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub address: ContentAddress,
    /// `true` when the remote store was unreachable and the blob is held
    /// only in the local cache.
    pub degraded: bool,
}

/// Content store that falls back to a local cache when the remote store is
/// unavailable.
///
/// Successful remote writes are mirrored into the cache so they remain
/// readable while the remote is down.
pub struct FallbackContentStore<R> {
    remote: R,
    cache: LocalCache,
}

impl<R: ContentStore> FallbackContentStore<R> {
    pub fn new(remote: R, cache: LocalCache) -> Self {
        Self { remote, cache }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Publish a blob, degrading to the local cache if the remote store is
    /// unavailable. Any other remote error is returned as is.
    pub async fn publish(&self, bytes: &[u8]) -> Result<Published, StoreError> {
        match self.remote.put(bytes).await {
            Ok(address) => {
                if let Err(e) = self.cache.write(&address, bytes).await {
                    tracing::warn!(address = %address, error = %e, "failed to mirror blob locally");
                }
                Ok(Published {
                    address,
                    degraded: false,
                })
            }
            Err(StoreError::Unavailable(reason)) => {
                tracing::warn!(
                    reason = %reason,
                    "content store unavailable, publishing to local cache"
                );
                let address = self.cache.put(bytes).await?;
                Ok(Published {
                    address,
                    degraded: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Serialize `value` as pretty JSON and publish it.
    pub async fn publish_json<T: Serialize + Sync>(
        &self,
        value: &T,
    ) -> Result<Published, StoreError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.publish(&bytes).await
    }

    /// Retry remote publication of a blob held under a local address.
    ///
    /// Remote addresses are returned unchanged.
    pub async fn republish(&self, address: &ContentAddress) -> Result<Published, StoreError> {
        if !address.is_local() {
            return Ok(Published {
                address: address.clone(),
                degraded: false,
            });
        }
        let bytes = self.cache.read(address).await?;
        self.publish(&bytes).await
    }

    /// Fetch a blob. Local addresses are served from the cache; remote
    /// addresses from the remote store, then from the mirror if the remote
    /// fails.
    pub async fn fetch(&self, address: &ContentAddress) -> Result<Bytes, StoreError> {
        if address.is_local() {
            return self.cache.read(address).await;
        }
        match self.remote.get(address).await {
            Ok(bytes) => Ok(bytes),
            Err(remote_err) => match self.cache.read(address).await {
                Ok(bytes) => {
                    tracing::debug!(
                        address = %address,
                        error = %remote_err,
                        "served blob from local mirror"
                    );
                    Ok(bytes)
                }
                Err(_) => Err(remote_err),
            },
        }
    }
}

#[async_trait]
impl<R: ContentStore> ContentStore for FallbackContentStore<R> {
    async fn put(&self, bytes: &[u8]) -> Result<ContentAddress, StoreError> {
        Ok(self.publish(bytes).await?.address)
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes, StoreError> {
        self.fetch(address).await
    }
}
