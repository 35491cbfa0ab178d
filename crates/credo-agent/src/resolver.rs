use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use credo_anchor::{AnchorError, ContentStore, FallbackContentStore, Ledger, RegistryAnchor};
use credo_core::{Did, DidMethod};
use credo_identity::{DidResolver, IdentityDocument, IdentityError};

/// Resolves DIDs through the registry and content store.
///
/// The registry is keyed by owner. `did:ethr` owners are the chain address
/// in the DID itself; any other DID is looked up under its own string
/// unless an owner has been recorded with [`AnchoredDidResolver::track`].
pub struct AnchoredDidResolver<S, L> {
    store: Arc<FallbackContentStore<S>>,
    registry: Arc<RegistryAnchor<L>>,
    owners: DashMap<Did, String>,
}

impl<S, L> AnchoredDidResolver<S, L>
where
    S: ContentStore,
    L: Ledger,
{
    pub fn new(store: Arc<FallbackContentStore<S>>, registry: Arc<RegistryAnchor<L>>) -> Self {
        Self {
            store,
            registry,
            owners: DashMap::new(),
        }
    }

    /// Record the registry owner a DID is anchored under.
    pub fn track(&self, did: &Did, owner: &str) {
        self.owners.insert(did.clone(), owner.to_string());
    }

    /// Registry owner used to look up `did`.
    pub fn owner_of(&self, did: &Did) -> String {
        if let Some(owner) = self.owners.get(did) {
            return owner.value().clone();
        }
        match did.method() {
            Some(DidMethod::Ethr) => did.method_specific_id().to_string(),
            _ => did.to_string(),
        }
    }
}

#[async_trait]
impl<S, L> DidResolver for AnchoredDidResolver<S, L>
where
    S: ContentStore,
    L: Ledger,
{
    async fn resolve(&self, did: &Did) -> Result<IdentityDocument, IdentityError> {
        let owner = self.owner_of(did);
        let record = self.registry.lookup(&owner).await.map_err(|e| match e {
            AnchorError::NotFound(_) => IdentityError::DidNotFound(did.to_string()),
            other => IdentityError::DidResolution(other.to_string()),
        })?;
        if record.did != *did {
            return Err(IdentityError::DidNotFound(did.to_string()));
        }

        let bytes = self
            .store
            .fetch(&record.content_address)
            .await
            .map_err(|e| IdentityError::DidResolution(e.to_string()))?;
        let document = IdentityDocument::from_json(&bytes)?;
        if document.id != *did {
            return Err(IdentityError::DidResolution(format!(
                "document at {} describes {}",
                record.content_address, document.id
            )));
        }

        tracing::debug!(did = %did, address = %record.content_address, "DID resolved");
        Ok(document)
    }
}
