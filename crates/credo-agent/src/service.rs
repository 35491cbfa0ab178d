//! Identity lifecycle orchestration.
//!
//! Creation runs in three stages: key generation, publication, anchoring.
//! A failed stage hands back an [`IdentityDraft`] holding everything done so
//! far, which [`IdentityService::resume`] picks up from the failed stage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use credo_anchor::{
    ContentStore, FallbackContentStore, IpfsContentStore, Ledger, LocalCache, RegistryAnchor,
};
use credo_core::{CredentialStatus, DidMethod};
use credo_credentials::{
    current_status, StatusTracker, VerifiableCredential, VerificationEngine, VerificationOutcome,
};
use credo_crypto::KeyPair;
use credo_identity::did::normalize_chain_address;
use credo_identity::{DidDeriver, DocumentBuilder, VerificationMethod, ALL_PURPOSES};

use crate::config::AgentConfig;
use crate::error::{AgentError, CreationFailed, Stage};
use crate::identity::{Identity, IdentityDraft};
use crate::resolver::AnchoredDidResolver;

/// Creates, rotates and resolves identities, and verifies credentials
/// against anchored issuer documents.
pub struct IdentityService<S, L> {
    store: Arc<FallbackContentStore<S>>,
    registry: Arc<RegistryAnchor<L>>,
    resolver: AnchoredDidResolver<S, L>,
    default_method: DidMethod,
    bundle_path: Option<PathBuf>,
    engine: VerificationEngine,
    tracker: StatusTracker,
}

impl<L: Ledger> IdentityService<IpfsContentStore, L> {
    /// Build a service backed by the configured IPFS endpoint and local cache.
    pub async fn from_config(config: &AgentConfig, ledger: L) -> Result<Self, AgentError> {
        let remote = IpfsContentStore::new(config.store.api_url.clone(), config.store.timeout())?;
        let cache = LocalCache::open(config.store.cache_dir.clone()).await?;
        let registry = RegistryAnchor::new(ledger).with_timeout(config.registry.timeout());

        tracing::info!(
            api_url = %config.store.api_url,
            cache_dir = %config.store.cache_dir.display(),
            default_method = %config.identity.default_method,
            "identity service configured"
        );
        let mut service = Self::new(FallbackContentStore::new(remote, cache), registry)
            .with_default_method(config.identity.default_method);
        if let Some(path) = &config.identity.bundle_path {
            service = service.with_bundle_path(path.clone());
        }
        Ok(service)
    }
}

impl<S, L> IdentityService<S, L>
where
    S: ContentStore,
    L: Ledger,
{
    pub fn new(store: FallbackContentStore<S>, registry: RegistryAnchor<L>) -> Self {
        let store = Arc::new(store);
        let registry = Arc::new(registry);
        Self {
            resolver: AnchoredDidResolver::new(store.clone(), registry.clone()),
            store,
            registry,
            default_method: DidMethod::Key,
            bundle_path: None,
            engine: VerificationEngine::new(),
            tracker: StatusTracker::new(),
        }
    }

    pub fn with_default_method(mut self, method: DidMethod) -> Self {
        self.default_method = method;
        self
    }

    /// Where [`IdentityService::load_or_create_default`] keeps the bundle.
    pub fn with_bundle_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bundle_path = Some(path.into());
        self
    }

    pub fn bundle_path(&self) -> Option<&Path> {
        self.bundle_path.as_deref()
    }

    pub fn with_engine(mut self, engine: VerificationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn store(&self) -> &FallbackContentStore<S> {
        &self.store
    }

    pub fn registry(&self) -> &RegistryAnchor<L> {
        &self.registry
    }

    pub fn resolver(&self) -> &AnchoredDidResolver<S, L> {
        &self.resolver
    }

    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    // ---- creation ----

    /// Create an identity under the default DID method.
    pub async fn create_identity(
        &self,
        chain_address: Option<&str>,
    ) -> Result<Identity, CreationFailed> {
        self.create_identity_with(self.default_method, chain_address).await
    }

    /// Run every creation stage for a fresh key.
    pub async fn create_identity_with(
        &self,
        method: DidMethod,
        chain_address: Option<&str>,
    ) -> Result<Identity, CreationFailed> {
        let draft = self.generate(method, chain_address).map_err(|source| CreationFailed {
            stage: Stage::KeyGeneration,
            draft: None,
            source,
        })?;
        self.resume(draft).await
    }

    /// Key generation stage: key pair, DID and initial document.
    ///
    /// The registry owner is the chain address when one is given, otherwise
    /// the DID itself.
    pub fn generate(
        &self,
        method: DidMethod,
        chain_address: Option<&str>,
    ) -> Result<IdentityDraft, AgentError> {
        let keypair = KeyPair::generate().map_err(AgentError::KeyGeneration)?;
        let public_key = keypair.public_key();
        let did = DidDeriver::derive(&public_key, method, chain_address)?;
        let owner = match chain_address {
            Some(address) => normalize_chain_address(address)?,
            None => did.to_string(),
        };
        let document = DocumentBuilder::build(&did, public_key.to_jwk());

        tracing::info!(did = %did, owner = %owner, "identity key generated");
        Ok(IdentityDraft {
            keypair,
            did,
            owner,
            document,
            published: None,
            receipt: None,
        })
    }

    /// Publication stage. A no-op if the draft is already published.
    pub async fn publish(&self, draft: &mut IdentityDraft) -> Result<(), AgentError> {
        if draft.published.is_some() {
            return Ok(());
        }
        let published = self.store.publish(&draft.document.to_json_vec()?).await?;
        if published.degraded {
            tracing::warn!(
                did = %draft.did,
                address = %published.address,
                "identity document held in local cache only"
            );
        } else {
            tracing::info!(
                did = %draft.did,
                address = %published.address,
                "identity document published"
            );
        }
        draft.published = Some(published);
        Ok(())
    }

    /// Anchoring stage. Requires a published draft; safe to repeat.
    pub async fn anchor(&self, draft: &mut IdentityDraft) -> Result<(), AgentError> {
        let published = draft
            .published
            .as_ref()
            .ok_or(AgentError::StageIncomplete(Stage::Publication))?;
        let receipt = self
            .registry
            .register(&draft.owner, &draft.did, &published.address)
            .await?;
        self.resolver.track(&draft.did, &draft.owner);
        draft.receipt = Some(receipt);
        Ok(())
    }

    /// Run the remaining stages of a draft.
    pub async fn resume(&self, mut draft: IdentityDraft) -> Result<Identity, CreationFailed> {
        while let Some(stage) = draft.next_stage() {
            let result = match stage {
                Stage::Publication => self.publish(&mut draft).await,
                Stage::Anchoring => self.anchor(&mut draft).await,
                Stage::KeyGeneration => Ok(()),
            };
            if let Err(source) = result {
                tracing::warn!(
                    did = %draft.did,
                    stage = %stage,
                    error = %source,
                    "identity creation interrupted"
                );
                return Err(CreationFailed {
                    stage,
                    draft: Some(Box::new(draft)),
                    source,
                });
            }
        }

        let did = draft.did.clone();
        let identity = draft.into_identity().map_err(|source| CreationFailed {
            stage: Stage::Anchoring,
            draft: None,
            source,
        })?;
        tracing::info!(did = %did, address = %identity.content_address, "identity created");
        Ok(identity)
    }

    // ---- maintenance ----

    /// Replace the identity's signing key.
    ///
    /// The new key becomes the only verification method, so credentials
    /// signed with the old key stop verifying. `identity` is left untouched
    /// unless every step succeeds.
    pub async fn rotate_key(&self, identity: &mut Identity) -> Result<(), AgentError> {
        let keypair = KeyPair::generate().map_err(AgentError::KeyGeneration)?;
        let now = Utc::now();

        let method_id = identity.document.next_method_id();
        let fragment = method_id
            .rsplit_once('#')
            .map(|(_, fragment)| fragment)
            .unwrap_or(method_id.as_str());
        let method = VerificationMethod::json_web_key(
            &identity.did,
            fragment,
            keypair.public_key().to_jwk(),
        );
        let mut document =
            DocumentBuilder::update_with_purposes(&identity.document, method, &ALL_PURPOSES, now)?;
        for old in &identity.document.verification_method {
            document = DocumentBuilder::revoke_method(&document, &old.id, now)?;
        }

        let published = self.store.publish(&document.to_json_vec()?).await?;
        let receipt = self
            .registry
            .update(
                &identity.owner,
                &identity.did,
                &published.address,
                &identity.content_address,
            )
            .await?;

        tracing::info!(
            did = %identity.did,
            method_id = %method_id,
            address = %published.address,
            "identity key rotated"
        );
        identity.private_key = keypair.export_private();
        identity.document = document;
        identity.content_address = published.address;
        identity.degraded = published.degraded;
        identity.receipt = receipt;
        Ok(())
    }

    /// Retry remote publication of a degraded identity and re-anchor it at
    /// the remote address. Returns whether the identity is now remote.
    pub async fn republish(&self, identity: &mut Identity) -> Result<bool, AgentError> {
        if !identity.degraded {
            return Ok(true);
        }
        let published = self.store.republish(&identity.content_address).await?;
        if published.degraded {
            return Ok(false);
        }
        let receipt = self
            .registry
            .update(
                &identity.owner,
                &identity.did,
                &published.address,
                &identity.content_address,
            )
            .await?;

        tracing::info!(
            did = %identity.did,
            address = %published.address,
            "identity document republished"
        );
        identity.content_address = published.address;
        identity.degraded = false;
        identity.receipt = receipt;
        Ok(true)
    }

    /// Load the identity bundle at `path`, or create and persist a new
    /// identity if there is none.
    pub async fn load_or_create(
        &self,
        path: &Path,
        chain_address: Option<&str>,
    ) -> anyhow::Result<Identity> {
        let path = path.to_path_buf();
        if tokio::fs::try_exists(&path).await? {
            let identity =
                tokio::task::spawn_blocking(move || Identity::load(&path)).await??;
            self.track(&identity);
            return Ok(identity);
        }
        tracing::info!(
            path = %path.display(),
            "no identity bundle found, creating a new identity"
        );
        let identity = self.create_identity(chain_address).await?;
        let identity = tokio::task::spawn_blocking(move || {
            identity.persist(&path)?;
            Ok::<_, anyhow::Error>(identity)
        })
        .await??;
        Ok(identity)
    }

    /// [`IdentityService::load_or_create`] at the configured bundle path.
    pub async fn load_or_create_default(
        &self,
        chain_address: Option<&str>,
    ) -> anyhow::Result<Identity> {
        let path = self
            .bundle_path
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no identity bundle path configured"))?;
        self.load_or_create(&path, chain_address).await
    }

    /// Make an identity created elsewhere resolvable through this service.
    pub fn track(&self, identity: &Identity) {
        self.resolver.track(&identity.did, &identity.owner);
    }

    // ---- credentials ----

    /// Verify a credential against its issuer's anchored document and
    /// record the resulting status.
    pub async fn verify_credential(
        &self,
        credential: &VerifiableCredential,
        now: DateTime<Utc>,
    ) -> (VerificationOutcome, CredentialStatus) {
        self.engine
            .verify_and_track(credential, &self.resolver, &self.tracker, now)
            .await
    }

    pub fn credential_status(
        &self,
        credential: &VerifiableCredential,
        now: DateTime<Utc>,
    ) -> CredentialStatus {
        current_status(credential, &self.tracker, now)
    }
}
